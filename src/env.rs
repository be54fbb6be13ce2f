use std::collections::{BTreeSet, HashMap};
use std::env::VarError;

/// Read access to an environment-variable store.
///
/// Code that wants to be testable takes an `&impl EnvBackend` instead of
/// calling [`std::env`] directly, so a test can put a
/// [`StubContext`](crate::StubContext) in front of the real environment.
pub trait EnvBackend {
    /// Read an environment variable
    ///
    /// # Errors
    ///
    /// Returns [`VarError::NotPresent`] if the variable is not set, or
    /// [`VarError::NotUnicode`] if its value is not valid unicode.
    fn var(&self, key: &str) -> Result<String, VarError>;

    /// Check whether an environment variable is set
    fn has(&self, key: &str) -> bool {
        self.var(key).is_ok()
    }

    /// Read an environment variable, falling back to `default` if it is not set
    fn var_or(&self, key: &str, default: &str) -> String {
        self.var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Names of every variable currently set
    fn keys(&self) -> BTreeSet<String>;
}

impl<B: EnvBackend + ?Sized> EnvBackend for &B {
    fn var(&self, key: &str) -> Result<String, VarError> {
        (**self).var(key)
    }

    fn has(&self, key: &str) -> bool {
        (**self).has(key)
    }

    fn var_or(&self, key: &str, default: &str) -> String {
        (**self).var_or(key, default)
    }

    fn keys(&self) -> BTreeSet<String> {
        (**self).keys()
    }
}

/// The live process environment. Never written to.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdEnvBackend;

impl EnvBackend for StdEnvBackend {
    fn var(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }

    fn has(&self, key: &str) -> bool {
        // a set but non-unicode variable still exists
        std::env::var_os(key).is_some()
    }

    fn keys(&self) -> BTreeSet<String> {
        std::env::vars_os()
            .filter_map(|(key, _)| key.into_string().ok())
            .collect()
    }
}

/// An in-memory stand-in for the process environment
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MockEnvBackend {
    vars: HashMap<String, String>,
}

impl MockEnvBackend {
    /// Set an environment variable
    pub fn set_var(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// Remove an environment variable
    pub fn remove(&mut self, key: &str) {
        self.vars.remove(key);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MockEnvBackend {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl EnvBackend for MockEnvBackend {
    fn var(&self, key: &str) -> Result<String, VarError> {
        self.vars.get(key).cloned().ok_or(VarError::NotPresent)
    }

    fn keys(&self) -> BTreeSet<String> {
        self.vars.keys().cloned().collect()
    }
}
