use dotenvy::dotenv;
use std::env;

pub const DEFAULT_AUDIT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Commands are audited only when this is set.
    pub audit_enabled: bool,
    /// Nesting depth kept when serializing a request for the audit trail.
    pub audit_max_depth: usize,
    /// Field names replaced with a mask in audited payloads (case-insensitive).
    pub audit_redacted_fields: Vec<String>,
    /// Upper bound on aggregated validation errors; `None` keeps all of them.
    pub max_validation_errors: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audit_enabled: true,
            audit_max_depth: DEFAULT_AUDIT_MAX_DEPTH,
            audit_redacted_fields: Vec::new(),
            max_validation_errors: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let audit_enabled = match lookup("TESSERA_AUDIT_ENABLED") {
            Some(val) => parse_bool(&val).unwrap_or(true),
            None => true,
        };

        let audit_max_depth = match lookup("TESSERA_AUDIT_MAX_DEPTH") {
            Some(val) => val
                .trim()
                .parse::<usize>()
                .unwrap_or(DEFAULT_AUDIT_MAX_DEPTH)
                .max(1),
            None => DEFAULT_AUDIT_MAX_DEPTH,
        };

        let audit_redacted_fields = match lookup("TESSERA_AUDIT_REDACTED_FIELDS") {
            Some(val) => val
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };

        let max_validation_errors = match lookup("TESSERA_MAX_VALIDATION_ERRORS") {
            Some(val) => val.trim().parse::<usize>().ok().filter(|n| *n > 0),
            None => None,
        };

        Self {
            audit_enabled,
            audit_max_depth,
            audit_redacted_fields,
            max_validation_errors,
        }
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
