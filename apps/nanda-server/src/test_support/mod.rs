use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Every variable the server reads before it starts serving.
pub(crate) const SERVICE_VARS: &[&str] = &[
    "PORT",
    "NANDA_BIND",
    "CERT_FILE",
    "KEY_FILE",
    "NANDA_MEMORY_PATH",
    "NANDA_RATE_LIMIT_PER_MIN",
    "NANDA_TOOLS",
    "NANDA_HTTP_MAX_CONC",
    "NANDA_SERVICE_NAME",
    "NANDA_AGENT_ID",
    "NANDA_AGENT_NAME",
    "OPENAPI_OUT",
];

/// Process environment with every service variable cleared except the given
/// overrides. Holds the env lock until dropped, then puts the previous values
/// back.
pub(crate) struct ServiceEnv {
    _lock: MutexGuard<'static, ()>,
    saved: Vec<(&'static str, Option<String>)>,
}

impl ServiceEnv {
    pub(crate) fn with(vars: &[(&'static str, &str)]) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved = SERVICE_VARS
            .iter()
            .map(|key| (*key, std::env::var(key).ok()))
            .collect();
        for key in SERVICE_VARS {
            std::env::remove_var(key);
        }
        let mut env = Self { _lock: lock, saved };
        for &(key, value) in vars {
            env.set(key, Some(value));
        }
        env
    }

    /// Overrides one service variable; `None` clears it again.
    pub(crate) fn set(&mut self, key: &'static str, value: Option<&str>) {
        assert!(SERVICE_VARS.contains(&key), "{key} is not a service variable");
        match value {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
}

impl Drop for ServiceEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            match value {
                Some(val) => std::env::set_var(key, val),
                None => std::env::remove_var(key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clears_service_vars_and_applies_overrides() {
        let mut env = ServiceEnv::with(&[("PORT", "9000")]);
        assert_eq!(env.saved.len(), SERVICE_VARS.len());
        assert_eq!(std::env::var("PORT").as_deref(), Ok("9000"));
        assert!(std::env::var("NANDA_AGENT_ID").is_err());

        env.set("NANDA_AGENT_ID", Some("agent-1"));
        assert_eq!(std::env::var("NANDA_AGENT_ID").as_deref(), Ok("agent-1"));
        env.set("PORT", None);
        assert!(std::env::var("PORT").is_err());
    }

    #[test]
    #[should_panic(expected = "not a service variable")]
    fn rejects_unrelated_variables() {
        let mut env = ServiceEnv::with(&[]);
        env.set("HOME", Some("/nowhere"));
    }
}
