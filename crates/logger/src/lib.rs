//! Tracing setup shared by the binaries.
mod subscriber;

pub use subscriber::{LogFormat, init_with, try_init_with};
