use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use prometheus_client::registry::Registry;

/// A metrics registry which can be shared across tasks.
#[derive(Clone)]
pub struct SharedRegistry(Arc<RwLock<Registry>>);

// Registration never leaves the registry half-updated, so a poisoned lock
// still guards a usable registry.
impl SharedRegistry {
    /// The process-wide registry, exported on `/metrics`.
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<SharedRegistry> = OnceLock::new();
        REGISTRY.get_or_init(SharedRegistry::default)
    }

    /// Register metrics under `prefix`, eg. `canopy_commits` for `commits`.
    pub fn with_prefix<A>(&self, prefix: impl AsRef<str>, f: impl FnOnce(&mut Registry) -> A) -> A {
        let mut registry = self.0.write().unwrap_or_else(PoisonError::into_inner);
        f(registry.sub_registry_with_prefix(prefix))
    }
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self(Arc::new(RwLock::new(Registry::default())))
    }
}

/// Encode every metric of `registry` in the Prometheus text format.
pub fn export<W: core::fmt::Write>(registry: &SharedRegistry, writer: &mut W) -> core::fmt::Result {
    let registry = registry.0.read().unwrap_or_else(PoisonError::into_inner);
    prometheus_client::encoding::text::encode(writer, &registry)
}

#[cfg(test)]
mod tests {
    use prometheus_client::metrics::counter::Counter;

    use super::*;

    #[test]
    fn exports_registered_metrics() {
        let registry = SharedRegistry::default();
        let counter: Counter = Counter::default();

        registry.with_prefix("canopy", |reg| {
            reg.register("test_events", "Events seen by the test", counter.clone())
        });
        counter.inc_by(3);

        let mut buf = String::new();
        export(&registry, &mut buf).unwrap();

        assert!(buf.contains("canopy_test_events_total 3"), "{buf}");
    }

    #[test]
    fn clones_share_the_registry() {
        let registry = SharedRegistry::default();
        let clone = registry.clone();
        let counter: Counter = Counter::default();

        clone.with_prefix("canopy", |reg| {
            reg.register("shared", "Registered through a clone", counter.clone())
        });
        counter.inc();

        let mut buf = String::new();
        export(&registry, &mut buf).unwrap();

        assert!(buf.contains("canopy_shared_total 1"), "{buf}");
        assert!(std::ptr::eq(SharedRegistry::global(), SharedRegistry::global()));
    }
}
