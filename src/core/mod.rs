//! 核心类型：错误

pub mod error;

pub use error::{ConfigError, MiddlewareError, NluError, PatternError};
