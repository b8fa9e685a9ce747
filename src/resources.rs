//! Thin per-family resource clients that consume the auth/transport core.

pub mod checkers;
pub mod pin;

pub use checkers::*;
pub use pin::*;
