use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::debug;

use crate::error::{Result, TransportError};

/// Well-known port the search for a free endpoint port starts from.
pub const DEFAULT_BASE_PORT: u16 = 4827;

/// Bookkeeping record stored against a claimed port.
///
/// Purely descriptive: the endpoint owns its socket, the registry only
/// remembers who claimed the port for lookup and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortOwner {
    label: String,
}

impl PortOwner {
    /// Create an owner record with a human-readable label (e.g. the pattern name).
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// The label given at claim time.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Table mapping claimed ports to their owners.
///
/// Allocation hands out the lowest port at or above [`PortRegistry::base`]
/// that is not currently claimed. The scan and the insert happen under one
/// lock, so concurrent callers never receive the same port.
///
/// Independent registries do not coordinate with each other; tests create
/// their own with [`PortRegistry::with_base`], applications usually share
/// [`PortRegistry::global`].
#[derive(Debug)]
pub struct PortRegistry {
    base: u16,
    ports: Mutex<BTreeMap<u16, PortOwner>>,
}

impl PortRegistry {
    /// Create an empty registry starting at [`DEFAULT_BASE_PORT`].
    pub fn new() -> Self {
        Self::with_base(DEFAULT_BASE_PORT)
    }

    /// Create an empty registry starting at `base`.
    pub fn with_base(base: u16) -> Self {
        Self {
            base,
            ports: Mutex::new(BTreeMap::new()),
        }
    }

    /// Process-wide registry, created on first use with the default base port.
    pub fn global() -> Arc<PortRegistry> {
        static GLOBAL: OnceLock<Arc<PortRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(PortRegistry::new())))
    }

    /// First port considered by [`PortRegistry::allocate`].
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Claim the lowest free port at or above the base and record `owner` against it.
    pub fn allocate(&self, owner: PortOwner) -> Result<u16> {
        let mut ports = self.lock();

        let mut candidate = u32::from(self.base);
        for &taken in ports.range(self.base..).map(|(port, _)| port) {
            if u32::from(taken) != candidate {
                break;
            }
            candidate += 1;
        }
        let port =
            u16::try_from(candidate).map_err(|_| TransportError::PortsExhausted { base: self.base })?;

        debug!(port, owner = owner.label(), "port claimed");
        ports.insert(port, owner);
        Ok(port)
    }

    /// Release a claimed port. Releasing a port that is not claimed is a no-op.
    pub fn release(&self, port: u16) -> Option<PortOwner> {
        let released = self.lock().remove(&port);
        if let Some(owner) = &released {
            debug!(port, owner = owner.label(), "port released");
        }
        released
    }

    /// Owner recorded for `port`, if claimed.
    pub fn owner(&self, port: u16) -> Option<PortOwner> {
        self.lock().get(&port).cloned()
    }

    /// Whether `port` is currently claimed.
    pub fn is_allocated(&self, port: u16) -> bool {
        self.lock().contains_key(&port)
    }

    /// All claimed ports in ascending order.
    pub fn allocated(&self) -> Vec<u16> {
        self.lock().keys().copied().collect()
    }

    /// Number of claimed ports.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no port is claimed.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Every mutation is a single insert or remove; a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<u16, PortOwner>> {
        self.ports.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PortRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;

    #[test]
    fn allocates_from_default_base() {
        let registry = PortRegistry::new();
        assert_eq!(registry.base(), 4827);
        assert_eq!(registry.allocate(PortOwner::new("reply")).unwrap(), 4827);
        assert_eq!(registry.allocate(PortOwner::new("push")).unwrap(), 4828);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn release_makes_port_reusable() {
        let registry = PortRegistry::with_base(9000);
        let first = registry.allocate(PortOwner::new("a")).unwrap();
        let second = registry.allocate(PortOwner::new("b")).unwrap();
        let third = registry.allocate(PortOwner::new("c")).unwrap();
        assert_eq!((first, second, third), (9000, 9001, 9002));

        assert_eq!(registry.release(second), Some(PortOwner::new("b")));
        assert!(!registry.is_allocated(second));

        // Lowest free port is handed out again.
        assert_eq!(registry.allocate(PortOwner::new("d")).unwrap(), 9001);
        assert_eq!(registry.allocate(PortOwner::new("e")).unwrap(), 9003);
    }

    #[test]
    fn release_unallocated_is_noop() {
        let registry = PortRegistry::with_base(9100);
        assert_eq!(registry.release(9100), None);
        assert_eq!(registry.release(1), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn owner_lookup() {
        let registry = PortRegistry::with_base(9200);
        let port = registry.allocate(PortOwner::new("publish")).unwrap();
        assert_eq!(registry.owner(port).unwrap().label(), "publish");
        assert!(registry.owner(port + 1).is_none());
    }

    #[test]
    fn concurrent_allocation_yields_distinct_ports() {
        let registry = Arc::new(PortRegistry::with_base(20000));
        let threads = 16;
        let per_thread = 25;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..per_thread)
                        .map(|i| {
                            registry
                                .allocate(PortOwner::new(format!("t{t}-{i}")))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for port in handle.join().unwrap() {
                assert!(port >= 20000);
                assert!(seen.insert(port), "port {port} handed out twice");
            }
        }
        assert_eq!(seen.len(), threads * per_thread);
        assert_eq!(registry.len(), threads * per_thread);
    }

    #[test]
    fn concurrent_allocate_and_release() {
        let registry = Arc::new(PortRegistry::with_base(30000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let port = registry.allocate(PortOwner::new("churn")).unwrap();
                        assert_eq!(registry.owner(port).unwrap().label(), "churn");
                        registry.release(port);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn exhaustion_at_top_of_range() {
        let registry = PortRegistry::with_base(u16::MAX - 1);
        assert_eq!(registry.allocate(PortOwner::new("a")).unwrap(), u16::MAX - 1);
        assert_eq!(registry.allocate(PortOwner::new("b")).unwrap(), u16::MAX);
        let err = registry.allocate(PortOwner::new("c")).unwrap_err();
        assert!(matches!(err, TransportError::PortsExhausted { base } if base == u16::MAX - 1));
    }

    #[test]
    fn allocated_is_sorted() {
        let registry = PortRegistry::with_base(9300);
        for _ in 0..4 {
            registry.allocate(PortOwner::new("x")).unwrap();
        }
        registry.release(9301);
        assert_eq!(registry.allocated(), vec![9300, 9302, 9303]);
    }

    #[test]
    fn global_is_shared() {
        let a = PortRegistry::global();
        let b = PortRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.base(), DEFAULT_BASE_PORT);
    }
}
