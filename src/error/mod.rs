// Error types for the gesture control engine
//
// This module defines custom error types for configuration and engine
// operations, providing structured error handling with numeric codes the
// host addon can report without parsing messages.

mod config;
mod engine;

pub use config::{log_config_error, ConfigError, ConfigErrorCodes};
pub use engine::{log_engine_error, EngineError, EngineErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the process boundary to the host addon.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
