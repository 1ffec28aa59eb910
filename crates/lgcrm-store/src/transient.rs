// ABOUTME: Transient durable medium for contexts with no persistent storage (headless, pre-render).
// ABOUTME: Blobs live in a process-wide map keyed by namespace, so every handle sees the same data.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::medium::{DurableMedium, MediumError};

type Namespaces = HashMap<String, HashMap<String, String>>;

static REGISTRY: OnceLock<Mutex<Namespaces>> = OnceLock::new();

fn registry() -> MutexGuard<'static, Namespaces> {
    REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A handle onto one namespace of the process-wide transient store.
/// Data lives until the process exits.
#[derive(Debug, Clone)]
pub struct TransientMedium {
    namespace: String,
}

impl TransientMedium {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl DurableMedium for TransientMedium {
    fn kind(&self) -> &'static str {
        "transient"
    }

    fn read(&self, key: &str) -> Result<Option<String>, MediumError> {
        Ok(registry()
            .get(&self.namespace)
            .and_then(|blobs| blobs.get(key))
            .cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), MediumError> {
        registry()
            .entry(self.namespace.clone())
            .or_default()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        if let Some(blobs) = registry().get_mut(&self.namespace) {
            blobs.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lgcrm_core::new_id;

    #[test]
    fn handles_on_same_namespace_share_data() {
        let namespace = new_id();
        TransientMedium::new(&namespace).write("k", "v").unwrap();

        let other = TransientMedium::new(&namespace);
        assert_eq!(other.read("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn namespaces_are_isolated() {
        let a = TransientMedium::new(new_id());
        let b = TransientMedium::new(new_id());

        a.write("k", "from-a").unwrap();

        assert!(b.read("k").unwrap().is_none());
    }
}
