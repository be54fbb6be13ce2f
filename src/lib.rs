use crate::config::Config;
use crate::resolver::Resolver;

pub mod config;
pub mod env;
mod logging;
pub mod resolver;
pub mod store;
pub use env::{EnvBackend, MockEnvBackend, StdEnvBackend};
pub use logging::init_logging;
pub use store::{KeyState, OverlayStore, StubValue};

/// A test-execution context that layers stubbed variables over a real environment.
///
/// Hand the context (or a reference to it) to any code that reads the
/// environment through [`EnvBackend`]. Stubs only exist inside the context,
/// the backend behind it is never written to.
#[derive(Debug)]
pub struct StubContext<B: EnvBackend> {
    backend: B,
    /// `None` until the first stub is registered
    overlay: Option<OverlayStore>,
}

impl<B: EnvBackend> StubContext<B> {
    /// Create a new context over `backend`, with nothing stubbed
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            overlay: None,
        }
    }

    /// Create a new context over `backend`, with the stubs from `config` applied
    #[must_use]
    pub fn with_config(backend: B, config: &Config) -> Self {
        let mut ctx = Self::new(backend);
        config.apply(&mut ctx);
        ctx
    }

    /// Run `test` with a fresh context over `backend`, tearing it down afterwards
    pub fn scoped<T>(backend: B, test: impl FnOnce(&mut Self) -> T) -> T {
        let mut ctx = Self::new(backend);
        let output = test(&mut ctx);
        ctx.finish();
        output
    }

    /// Stub a single variable.
    ///
    /// Pass a string to give the variable a value, or `None` / [`StubValue::Unset`]
    /// to make it look unset. Stubbing the same key again replaces the old stub.
    pub fn stub(&mut self, key: impl Into<String>, value: impl Into<StubValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        tracing::trace!(key = %key, value = ?value, "stubbing environment variable");
        self.overlay_mut().set_stub(key, value);
        self
    }

    /// Stub every variable in `stubs`
    pub fn stub_all<K, V>(&mut self, stubs: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<StubValue>,
    {
        for (key, value) in stubs {
            self.stub(key, value);
        }
        self
    }

    /// Whether anything has been stubbed in this context yet
    #[must_use]
    pub const fn is_stubbed(&self) -> bool {
        self.overlay.is_some()
    }

    /// The stub state of `key`
    #[must_use]
    pub fn state(&self, key: &str) -> KeyState<'_> {
        self.overlay
            .as_ref()
            .map_or(KeyState::Unstubbed, |overlay| overlay.state(key))
    }

    /// The registered stubs, if any
    #[must_use]
    pub const fn overlay(&self) -> Option<&OverlayStore> {
        self.overlay.as_ref()
    }

    /// The real environment behind this context
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// End the context, discarding every stub and returning the untouched backend
    pub fn finish(self) -> B {
        if let Some(overlay) = &self.overlay {
            tracing::debug!(stubs = overlay.len(), "tearing down environment stubs");
        }
        self.backend
    }

    fn overlay_mut(&mut self) -> &mut OverlayStore {
        self.overlay.get_or_insert_with(|| {
            tracing::debug!("initializing environment stub overlay");
            OverlayStore::new()
        })
    }

    fn reader<T>(&self, read: impl FnOnce(&dyn EnvBackend) -> T) -> T {
        match &self.overlay {
            Some(overlay) => read(&Resolver::new(overlay, &self.backend)),
            None => read(&self.backend),
        }
    }
}

impl Default for StubContext<StdEnvBackend> {
    fn default() -> Self {
        Self::new(StdEnvBackend)
    }
}

impl<B: EnvBackend> EnvBackend for StubContext<B> {
    fn var(&self, key: &str) -> Result<String, std::env::VarError> {
        self.reader(|env| env.var(key))
    }

    fn has(&self, key: &str) -> bool {
        self.reader(|env| env.has(key))
    }

    fn var_or(&self, key: &str, default: &str) -> String {
        self.reader(|env| env.var_or(key, default))
    }

    fn keys(&self) -> std::collections::BTreeSet<String> {
        self.reader(|env| env.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn real_env() -> MockEnvBackend {
        [("UNSTUBBED", "unstubbed")].into_iter().collect()
    }

    #[rstest]
    fn test_overlay_is_created_lazily(real_env: MockEnvBackend) {
        let mut ctx = StubContext::new(real_env);
        assert!(!ctx.is_stubbed());
        assert!(ctx.overlay().is_none());

        ctx.stub("TEST", "success");
        assert!(ctx.is_stubbed());
        assert_eq!(ctx.overlay().map(OverlayStore::len), Some(1));
    }

    #[rstest]
    fn test_repeated_stubbing_keeps_one_overlay(real_env: MockEnvBackend) {
        let mut ctx = StubContext::new(real_env);
        ctx.stub("A", "1");
        ctx.stub("B", "2");
        ctx.stub("A", "3");

        assert_eq!(ctx.overlay().map(OverlayStore::len), Some(2));
        assert_eq!(ctx.state("A"), KeyState::Value("3"));
        assert_eq!(ctx.state("B"), KeyState::Value("2"));
    }

    #[rstest]
    fn test_pristine_context_delegates(real_env: MockEnvBackend) {
        let ctx = StubContext::new(real_env.clone());
        assert_eq!(ctx.var("UNSTUBBED"), real_env.var("UNSTUBBED"));
        assert_eq!(ctx.keys(), real_env.keys());
        assert_eq!(ctx.state("UNSTUBBED"), KeyState::Unstubbed);
    }

    #[rstest]
    fn test_finish_returns_untouched_backend(real_env: MockEnvBackend) {
        let mut ctx = StubContext::new(real_env.clone());
        ctx.stub("UNSTUBBED", None::<String>).stub("NEW", "value");

        let backend = ctx.finish();
        assert_eq!(backend, real_env);
        assert_eq!(backend.var("UNSTUBBED"), Ok("unstubbed".to_string()));
        assert!(!backend.has("NEW"));
    }

    #[rstest]
    fn test_scoped_context_does_not_leak(real_env: MockEnvBackend) {
        let seen = StubContext::scoped(&real_env, |ctx| {
            ctx.stub("TEST", "success");
            ctx.var("TEST")
        });
        assert_eq!(seen, Ok("success".to_string()));

        StubContext::scoped(&real_env, |ctx| {
            assert!(!ctx.is_stubbed());
            assert!(!ctx.has("TEST"));
        });
    }
}
