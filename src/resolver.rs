use std::collections::BTreeSet;
use std::env::VarError;

use crate::env::EnvBackend;
use crate::store::{KeyState, OverlayStore};

/// Answers environment queries from an [`OverlayStore`] layered over a real backend.
///
/// Stubs always win. Keys that were never stubbed are answered by the
/// backend exactly as it would answer them on its own.
#[derive(Debug)]
pub struct Resolver<'a, B: ?Sized> {
    store: &'a OverlayStore,
    real: &'a B,
}

impl<'a, B: EnvBackend + ?Sized> Resolver<'a, B> {
    #[must_use]
    pub const fn new(store: &'a OverlayStore, real: &'a B) -> Self {
        Self { store, real }
    }
}

impl<B: EnvBackend + ?Sized> EnvBackend for Resolver<'_, B> {
    fn var(&self, key: &str) -> Result<String, VarError> {
        match self.store.state(key) {
            KeyState::Value(value) => Ok(value.to_string()),
            KeyState::Absent => Err(VarError::NotPresent),
            KeyState::Unstubbed => self.real.var(key),
        }
    }

    fn has(&self, key: &str) -> bool {
        match self.store.state(key) {
            KeyState::Value(_) => true,
            KeyState::Absent => false,
            KeyState::Unstubbed => self.real.has(key),
        }
    }

    fn var_or(&self, key: &str, default: &str) -> String {
        match self.store.state(key) {
            // an empty stub is still a value, it must not let the default through
            KeyState::Value(value) => value.to_string(),
            KeyState::Absent => default.to_string(),
            KeyState::Unstubbed => self.real.var_or(key, default),
        }
    }

    fn keys(&self) -> BTreeSet<String> {
        let mut keys = self.real.keys();
        keys.extend(self.store.valued_keys().map(str::to_string));
        for key in self.store.absent_keys() {
            keys.remove(key);
        }
        keys
    }
}
