//! Named meter registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::rate::{MeterSnapshot, RateMeter};
use crate::config::RegistryConfig;
use crate::error::{MeterError, Result};

/// A concurrent map of meters keyed by metric name.
///
/// Meters are handed out as `Arc`s so instrumented code can keep marking
/// them without going through the registry on every event.
#[derive(Debug, Default)]
pub struct MeterRegistry {
    meters: DashMap<String, Arc<RateMeter>>,
}

impl MeterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding one meter per configured entry.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let registry = Self::new();
        for (name, meter_config) in &config.meters {
            registry.register(name, meter_config.build()?)?;
        }
        Ok(registry)
    }

    /// Add a meter under `name`.
    ///
    /// Fails if the name is already taken.
    pub fn register(&self, name: &str, meter: RateMeter) -> Result<Arc<RateMeter>> {
        match self.meters.entry(name.to_string()) {
            Entry::Occupied(_) => Err(MeterError::DuplicateMeter(name.to_string())),
            Entry::Vacant(vacant) => {
                debug!(
                    name = %name,
                    window = ?meter.window(),
                    decay = %meter.decay_kind(),
                    "Registering meter"
                );
                Ok(vacant.insert(Arc::new(meter)).clone())
            }
        }
    }

    /// Get the meter for `name`, creating it with `make` if missing.
    pub fn get_or_create<F>(&self, name: &str, make: F) -> Arc<RateMeter>
    where
        F: FnOnce() -> RateMeter,
    {
        self.meters
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(name = %name, "Creating meter on first use");
                Arc::new(make())
            })
            .clone()
    }

    /// Get the meter for `name`.
    pub fn get(&self, name: &str) -> Option<Arc<RateMeter>> {
        self.meters.get(name).map(|m| m.clone())
    }

    /// Remove the meter for `name`, returning it if present.
    pub fn remove(&self, name: &str) -> Option<Arc<RateMeter>> {
        let removed = self.meters.remove(name).map(|(_, meter)| meter);
        if removed.is_some() {
            debug!(name = %name, "Removed meter");
        }
        removed
    }

    /// Number of registered meters.
    pub fn len(&self) -> usize {
        self.meters.len()
    }

    /// Whether the registry has no meters.
    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.meters.iter().map(|m| m.key().clone()).collect();
        names.sort();
        names
    }

    /// Snapshot every meter. Decays each meter as a side effect.
    pub fn snapshot(&self) -> BTreeMap<String, MeterSnapshot> {
        self.meters
            .iter()
            .map(|m| (m.key().clone(), m.value().snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::DecayKind;
    use std::time::Duration;

    #[test]
    fn test_registry_creation() {
        let registry = MeterRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_get() {
        let registry = MeterRegistry::new();
        let meter = registry
            .register("requests", RateMeter::linear(Duration::from_secs(1)))
            .unwrap();
        meter.mark(3);

        let fetched = registry.get("requests").unwrap();
        assert!(Arc::ptr_eq(&meter, &fetched));
        assert_eq!(fetched.count(), 3);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_register_duplicate_fails() {
        let registry = MeterRegistry::new();
        registry
            .register("requests", RateMeter::linear(Duration::from_secs(1)))
            .unwrap();

        let err = registry
            .register("requests", RateMeter::half_life(Duration::from_secs(1)))
            .unwrap_err();
        assert!(matches!(err, MeterError::DuplicateMeter(name) if name == "requests"));
        assert_eq!(
            registry.get("requests").unwrap().decay_kind(),
            DecayKind::Linear
        );
    }

    #[test]
    fn test_get_or_create_returns_same_meter() {
        let registry = MeterRegistry::new();
        let first = registry.get_or_create("errors", || RateMeter::linear(Duration::from_secs(1)));
        let second =
            registry.get_or_create("errors", || RateMeter::half_life(Duration::from_secs(9)));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.decay_kind(), DecayKind::Linear);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let registry = MeterRegistry::new();
        registry.get_or_create("requests", || RateMeter::linear(Duration::from_secs(1)));

        assert!(registry.remove("requests").is_some());
        assert!(registry.remove("requests").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_from_config() {
        let yaml = r#"
meters:
  requests:
    window_ms: 2000
    decay: half_life
  errors:
    decay: mean_lifetime
"#;
        let config = RegistryConfig::from_yaml(yaml).unwrap();
        let registry = MeterRegistry::from_config(&config).unwrap();

        assert_eq!(
            registry.names(),
            vec!["errors".to_string(), "requests".to_string()]
        );
        let requests = registry.get("requests").unwrap();
        assert_eq!(requests.window(), Duration::from_secs(2));
        assert_eq!(requests.decay_kind(), DecayKind::HalfLife);
    }

    #[test]
    fn test_from_config_rejects_zero_window() {
        let config = RegistryConfig::from_yaml("meters:\n  bad:\n    window_ms: 0\n").unwrap();
        assert!(matches!(
            MeterRegistry::from_config(&config),
            Err(MeterError::InvalidWindow)
        ));
    }

    #[test]
    fn test_snapshot() {
        let registry = MeterRegistry::new();
        registry
            .get_or_create("a", || RateMeter::linear(Duration::from_secs(60)))
            .mark(2);
        registry
            .get_or_create("b", || RateMeter::mean_lifetime(Duration::from_secs(60)))
            .mark(5);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["a"].count, 2);
        assert_eq!(snapshot["b"].count, 5);
        assert!(snapshot["b"].rate <= 5.0);
        assert_eq!(snapshot["b"].decay, DecayKind::MeanLifetime);
    }

    #[test]
    fn test_concurrent_get_or_create() {
        let registry = MeterRegistry::new();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        registry
                            .get_or_create("shared", || RateMeter::linear(Duration::from_secs(1)))
                            .mark(1);
                    }
                });
            }
        });

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("shared").unwrap().count(), 800);
    }
}
