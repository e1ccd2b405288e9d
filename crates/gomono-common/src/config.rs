//! Session configuration.

use std::env;

/// Environment variable holding a comma separated list of trace targets
/// (`checker`, `translator`, `all`, or `1` for all).
pub const TRACE_ENV: &str = "GOMONO_TRACE";

/// Which phases write trace output through the `log` facade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceConfig {
    pub trace_checker: bool,
    pub trace_translator: bool,
}

impl TraceConfig {
    pub fn all() -> Self {
        Self {
            trace_checker: true,
            trace_translator: true,
        }
    }

    /// Reads [`TRACE_ENV`]; an unset variable disables tracing.
    pub fn from_env() -> Self {
        match env::var(TRACE_ENV) {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::default(),
        }
    }

    /// Parses a trace target list. Unknown targets are ignored with a warning.
    pub fn parse(value: &str) -> Self {
        let mut config = Self::default();
        for target in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match target {
                "1" | "all" => config = Self::all(),
                "checker" => config.trace_checker = true,
                "translator" => config.trace_translator = true,
                other => log::warn!("{}: unknown trace target `{}`", TRACE_ENV, other),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(TraceConfig::parse(""), TraceConfig::default());
        assert_eq!(TraceConfig::parse("1"), TraceConfig::all());
        let cfg = TraceConfig::parse("checker, bogus");
        assert!(cfg.trace_checker);
        assert!(!cfg.trace_translator);
        assert_eq!(TraceConfig::parse("translator,checker"), TraceConfig::all());
    }
}
