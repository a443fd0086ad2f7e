use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::loader::RulePackLoader;
use super::model::RulePack;
use crate::error::EngineError;

/// Read-through cache of composed rule packs, keyed by identifier.
///
/// Cached packs are immutable; `invalidate` or `clear` force a re-read on
/// the next request. Watching the content root for changes is the
/// caller's concern.
pub struct PackCache {
    loader: RulePackLoader,
    packs: RwLock<HashMap<String, Arc<RulePack>>>,
}

impl PackCache {
    pub fn new(loader: RulePackLoader) -> Self {
        Self {
            loader,
            packs: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached pack for `identifier`, composing it on first use.
    pub fn get(&self, identifier: &str) -> Result<Arc<RulePack>, EngineError> {
        {
            let packs = self.packs.read().expect("pack cache lock poisoned");
            if let Some(pack) = packs.get(identifier) {
                return Ok(Arc::clone(pack));
            }
        }

        let pack = Arc::new(self.loader.load(identifier)?);
        let mut packs = self.packs.write().expect("pack cache lock poisoned");
        Ok(Arc::clone(
            packs
                .entry(identifier.to_string())
                .or_insert_with(|| Arc::clone(&pack)),
        ))
    }

    /// Drop one cached pack so the next `get` re-composes it.
    pub fn invalidate(&self, identifier: &str) {
        self.packs
            .write()
            .expect("pack cache lock poisoned")
            .remove(identifier);
    }

    /// Drop every cached pack.
    pub fn clear(&self) {
        self.packs
            .write()
            .expect("pack cache lock poisoned")
            .clear();
    }
}
