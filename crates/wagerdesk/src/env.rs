//! Environment variable access behind a trait, so configuration can be
//! resolved in tests without touching the process environment.

use std::collections::HashMap;

/// Source of environment variables.
pub trait EnvReader {
    /// `None` when unset or not valid unicode.
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealEnv;

impl EnvReader for RealEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of variables; everything else reads as unset.
#[derive(Debug, Default, Clone)]
pub struct MockEnv {
    vars: HashMap<String, String>,
}

impl MockEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.vars.insert(name, value);
        self
    }
}

impl EnvReader for MockEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).map(String::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn mock_env_returns_set_vars_only() {
        let env = MockEnv::new().with_var("WAGERDESK_API_URL", "http://localhost:9000");
        assert_eq!(
            env.var("WAGERDESK_API_URL").as_deref(),
            Some("http://localhost:9000")
        );
        assert_eq!(env.var("HOME"), None);
    }

    #[test]
    #[serial]
    fn real_env_reads_process_vars() {
        std::env::set_var("WAGERDESK_ENV_PROBE", "1");
        assert_eq!(RealEnv.var("WAGERDESK_ENV_PROBE").as_deref(), Some("1"));
        std::env::remove_var("WAGERDESK_ENV_PROBE");
        assert_eq!(RealEnv.var("WAGERDESK_ENV_PROBE"), None);
    }
}
