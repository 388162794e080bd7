//! Label table: symbolic name to address.

use crate::cpu::execute::EngineError;
use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTable {
    labels: BTreeMap<String, u32>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `address`, replacing any earlier binding.
    pub fn bind(&mut self, name: impl Into<String>, address: u32) {
        let name = name.into();
        tracing::trace!(%name, address, "bind label");
        self.labels.insert(name, address);
    }

    /// Look a label up. Unbound names are an error, never zero.
    pub fn resolve(&self, name: &str) -> Result<u32, EngineError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::LabelNotFound(name.to_string()))
    }

    /// Bindings sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.labels.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
