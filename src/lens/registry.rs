//! Lens registry.
//!
//! An explicit, constructed registry passed into the engine at startup -
//! not a process-wide singleton - so multiple engines can run in tests
//! without cross-contamination.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::{CoreError, LensId, LookupError};

use super::{Lens, builtin};

#[derive(Clone, Default)]
pub struct LensRegistry {
    by_id: BTreeMap<LensId, Arc<dyn Lens>>,
}

impl LensRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the stock lenses.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for lens in builtin::all() {
            registry
                .register(lens)
                .expect("builtin lens ids are unique");
        }
        registry
    }

    pub fn register(&mut self, lens: Arc<dyn Lens>) -> Result<(), CoreError> {
        let id = lens.meta().id.clone();
        if self.by_id.contains_key(&id) {
            return Err(LookupError::DuplicateLens { id: id.to_string() }.into());
        }
        self.by_id.insert(id, lens);
        Ok(())
    }

    pub fn get(&self, id: &LensId) -> Option<&Arc<dyn Lens>> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &LensId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Registered lens ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &LensId> {
        self.by_id.keys()
    }
}

impl std::fmt::Debug for LensRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LensRegistry")
            .field("lenses", &self.by_id.keys().collect::<Vec<_>>())
            .finish()
    }
}
