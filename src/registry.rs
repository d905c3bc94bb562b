//! Capability trait and the name → capability lookup table.

use crate::context::ExecutionContext;
use crate::error::ConversionError;
use crate::request::Parameters;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// A pluggable unit that executes a named action against a set of files.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Run `action` on `files`, returning the paths of everything produced.
    async fn execute(
        &self,
        action: &str,
        params: &Parameters,
        files: &[String],
        ctx: &ExecutionContext,
    ) -> Result<Vec<PathBuf>, ConversionError>;
}

/// Registered capabilities, keyed by agent name.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    entries: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `capability` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, capability: Arc<dyn Capability>) {
        self.entries.insert(name.into(), capability);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.entries.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl Capability for Fixed {
        async fn execute(
            &self,
            _action: &str,
            _params: &Parameters,
            _files: &[String],
            _ctx: &ExecutionContext,
        ) -> Result<Vec<PathBuf>, ConversionError> {
            Ok(vec![PathBuf::from(self.0)])
        }
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let mut registry = CapabilityRegistry::new();
        registry.register("renderer", Arc::new(Fixed("first.png")));
        registry.register("renderer", Arc::new(Fixed("second.png")));
        assert_eq!(registry.len(), 1);

        let cap = registry.get("renderer").unwrap();
        let ctx = ExecutionContext::detached(crate::Scope::new());
        let out = cap
            .execute("convert", &Parameters::new(), &[], &ctx)
            .await
            .unwrap();
        assert_eq!(out, vec![PathBuf::from("second.png")]);
    }

    #[test]
    fn unknown_name_is_absent() {
        let mut registry = CapabilityRegistry::new();
        assert!(registry.is_empty());
        registry.register("b", Arc::new(Fixed("x")));
        registry.register("a", Arc::new(Fixed("y")));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.names(), vec!["a", "b"]);
    }
}
