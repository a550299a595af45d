use super::config::LogLevel;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("Invalid log level '{input}'. Valid levels: error, warn, info, debug, trace")]
    InvalidLogLevel { input: String },

    #[error("Invalid directive format '{input}'. Expected: 'target=level'")]
    InvalidDirectiveFormat { input: String },

    #[error("Empty target in directive '{input}'")]
    EmptyTarget { input: String },

    #[error("Logging system initialization failed: {details}")]
    LoggingInitFailed {
        details: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl InitializationError {
    pub fn fallback_strategy(&self) -> FallbackStrategy {
        match self {
            InitializationError::InvalidLogLevel { .. } => FallbackStrategy::UseDefaultLevel,
            InitializationError::InvalidDirectiveFormat { .. }
            | InitializationError::EmptyTarget { .. } => FallbackStrategy::SkipDirective,
            InitializationError::LoggingInitFailed { .. } => FallbackStrategy::Abort,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStrategy {
    UseDefaultLevel,
    SkipDirective,
    Abort,
}

/// One `target=level` entry of the tracing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirective {
    pub target: String,
    pub level: LogLevel,
}

impl LogDirective {
    pub fn new(target: impl Into<String>, level: LogLevel) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }

    pub fn parse(directive: &str) -> Result<Self, InitializationError> {
        let Some((target, level)) = directive.split_once('=') else {
            return Err(InitializationError::InvalidDirectiveFormat {
                input: directive.to_string(),
            });
        };

        if level.contains('=') {
            return Err(InitializationError::InvalidDirectiveFormat {
                input: directive.to_string(),
            });
        }

        let target = target.trim();
        if target.is_empty() {
            return Err(InitializationError::EmptyTarget {
                input: directive.to_string(),
            });
        }

        let level = LogLevel::from_str(level.trim())?;
        Ok(LogDirective::new(target, level))
    }

    pub fn to_filter_string(&self) -> String {
        format!("{}={}", self.target, self.level.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directive_parsing_valid_cases() {
        let valid_cases = [
            ("hyper=warn", "hyper", LogLevel::Warn),
            ("reqwest=error", "reqwest", LogLevel::Error),
            ("rask_search_analytics=debug", "rask_search_analytics", LogLevel::Debug),
            (" warp = info ", "warp", LogLevel::Info),
        ];

        for (input, target, level) in valid_cases {
            let directive = LogDirective::parse(input).unwrap();
            assert_eq!(directive.target, target, "input: {input}");
            assert_eq!(directive.level, level, "input: {input}");
        }
    }

    #[test]
    fn test_log_directive_parsing_invalid_cases() {
        let invalid_cases = [
            ("", "empty string"),
            ("hyper", "missing level"),
            ("=warn", "empty target"),
            ("hyper=", "empty level"),
            ("hyper=loud", "invalid level"),
            ("hyper=warn=extra", "too many parts"),
        ];

        for (input, description) in invalid_cases {
            assert!(
                LogDirective::parse(input).is_err(),
                "Should fail for {description}: {input}"
            );
        }
    }

    #[test]
    fn test_fallback_strategy() {
        let err = LogDirective::parse("target=loud").unwrap_err();
        assert_eq!(err.fallback_strategy(), FallbackStrategy::UseDefaultLevel);

        let err = LogDirective::parse("no-level").unwrap_err();
        assert_eq!(err.fallback_strategy(), FallbackStrategy::SkipDirective);

        let err = LogDirective::parse("=warn").unwrap_err();
        assert_eq!(err.fallback_strategy(), FallbackStrategy::SkipDirective);
    }

    #[test]
    fn test_to_filter_string() {
        assert_eq!(
            LogDirective::new("reqwest", LogLevel::Error).to_filter_string(),
            "reqwest=error"
        );
    }
}
