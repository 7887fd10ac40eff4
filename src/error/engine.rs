// Engine error types and constants

use crate::error::{ConfigError, ErrorCode};
use log::error;
use std::fmt;

/// Engine error code constants
///
/// Error code range: 4001-4002
pub struct EngineErrorCodes {}

impl EngineErrorCodes {
    /// Engine state mutex was poisoned by a panicking caller
    pub const LOCK_POISONED: i32 = 4001;

    /// Reconfiguration rejected by validation
    pub const CONFIG_REJECTED: i32 = 4002;
}

/// Log an engine error with structured context
pub fn log_engine_error(err: &EngineError, context: &str) {
    error!(
        "Engine error in {}: code={}, component=EngineHandle, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors surfaced by the thread-safe `EngineHandle`
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Mutex guarding engine state was poisoned
    LockPoisoned { component: String },

    /// New configuration failed validation; previous one stays active
    Config(ConfigError),
}

impl ErrorCode for EngineError {
    fn code(&self) -> i32 {
        match self {
            EngineError::LockPoisoned { .. } => EngineErrorCodes::LOCK_POISONED,
            EngineError::Config(_) => EngineErrorCodes::CONFIG_REJECTED,
        }
    }

    fn message(&self) -> String {
        match self {
            EngineError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
            EngineError::Config(err) => {
                format!("Configuration rejected: {}", err.message())
            }
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EngineError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Config(err) => Some(err),
            EngineError::LockPoisoned { .. } => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err)
    }
}
