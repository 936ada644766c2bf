use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub mod context;
pub mod run_context;

pub use context::{ExecutionContext, ExecutionContextExt};
pub use run_context::RunContext;

#[derive(
    Serialize, Deserialize, JsonSchema, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord,
)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
pub struct LogMessage {
    pub message: String,
    pub log_level: LogLevel,
    pub node: Option<String>,
    pub timestamp: SystemTime,
}

impl LogMessage {
    pub fn new(message: &str, log_level: LogLevel, node: Option<String>) -> Self {
        LogMessage {
            message: message.to_string(),
            log_level,
            node,
            timestamp: SystemTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels_are_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn > LogLevel::Info);
        assert!(LogLevel::Fatal > LogLevel::Error);
    }
}
