use std::collections::HashMap;

/// A stubbed value for a single environment variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StubValue {
    /// The variable is set to this value (the empty string included)
    Set(String),
    /// The variable is treated as if it does not exist
    Unset,
}

impl From<&str> for StubValue {
    fn from(value: &str) -> Self {
        Self::Set(value.to_string())
    }
}

impl From<String> for StubValue {
    fn from(value: String) -> Self {
        Self::Set(value)
    }
}

impl<T: Into<String>> From<Option<T>> for StubValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, |value| Self::Set(value.into()))
    }
}

/// Where a key currently stands within one stubbed context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState<'a> {
    /// Never stubbed, reads go to the real environment
    Unstubbed,
    /// Stubbed with a value
    Value(&'a str),
    /// Stubbed as absent
    Absent,
}

/// The stubs registered in one test-execution context.
///
/// Every stubbed key maps to exactly one [`StubValue`], so a key is never
/// both valued and absent at once.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OverlayStore {
    stubs: HashMap<String, StubValue>,
}

impl OverlayStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub `key` with `value`, replacing whatever was stubbed before.
    ///
    /// Returns the previous stub for `key`, if any.
    pub fn set_stub(
        &mut self,
        key: impl Into<String>,
        value: impl Into<StubValue>,
    ) -> Option<StubValue> {
        self.stubs.insert(key.into(), value.into())
    }

    /// Look up the state of `key`
    #[must_use]
    pub fn state(&self, key: &str) -> KeyState<'_> {
        match self.stubs.get(key) {
            None => KeyState::Unstubbed,
            Some(StubValue::Set(value)) => KeyState::Value(value),
            Some(StubValue::Unset) => KeyState::Absent,
        }
    }

    #[must_use]
    pub fn is_valued(&self, key: &str) -> bool {
        matches!(self.state(key), KeyState::Value(_))
    }

    #[must_use]
    pub fn is_absent(&self, key: &str) -> bool {
        matches!(self.state(key), KeyState::Absent)
    }

    /// Keys stubbed with a value
    pub fn valued_keys(&self) -> impl Iterator<Item = &str> {
        self.stubs.iter().filter_map(|(key, value)| match value {
            StubValue::Set(_) => Some(key.as_str()),
            StubValue::Unset => None,
        })
    }

    /// Keys stubbed as absent
    pub fn absent_keys(&self) -> impl Iterator<Item = &str> {
        self.stubs.iter().filter_map(|(key, value)| match value {
            StubValue::Set(_) => None,
            StubValue::Unset => Some(key.as_str()),
        })
    }

    /// Number of stubbed keys, absent ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}
