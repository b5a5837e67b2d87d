//! A small service registry with lazy initialization.
//!
//! Services are registered under string names as eager values, memoized
//! factories, or prototypes. Factories capture their dependencies in the
//! closure and must not call back into the registry they live in.

use crate::error::ServiceError;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

type Service = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn() -> Service + Send + Sync>;

enum ServiceSlot {
    /// A built instance, handed out as-is.
    Ready(Service),
    /// Built on first access, then memoized as `Ready`.
    Deferred(Factory),
    /// Built fresh on every access.
    Prototype(Factory),
}

impl ServiceSlot {
    fn kind(&self) -> &'static str {
        match self {
            ServiceSlot::Ready(_) => "ready",
            ServiceSlot::Deferred(_) => "deferred",
            ServiceSlot::Prototype(_) => "prototype",
        }
    }
}

/// String-keyed store of shared services.
///
/// `get` downcasts to the requested type, so the same registry can hold
/// services of unrelated types. Registering a name twice replaces the
/// earlier slot.
#[derive(Default)]
pub struct ServiceRegistry {
    slots: RwLock<HashMap<String, ServiceSlot>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-built service.
    pub fn set_value<T>(&self, name: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.insert(name.into(), ServiceSlot::Ready(Arc::new(value)));
    }

    /// Register a factory that runs at most once; its result is memoized
    /// and shared by every later lookup.
    pub fn set_factory<T, F>(&self, name: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let slot = ServiceSlot::Deferred(Box::new(move || Arc::new(factory()) as Service));
        self.insert(name.into(), slot);
    }

    /// Register a factory that builds a fresh instance on every lookup.
    pub fn set_prototype<T, F>(&self, name: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let slot = ServiceSlot::Prototype(Box::new(move || Arc::new(factory()) as Service));
        self.insert(name.into(), slot);
    }

    /// Fetch a service by name.
    ///
    /// A deferred slot builds its instance here, under the write lock, so
    /// racing lookups still run the factory only once.
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>, ServiceError>
    where
        T: Any + Send + Sync,
    {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            match slots.get(name) {
                None => return Err(ServiceError::Unregistered(name.to_string())),
                Some(ServiceSlot::Ready(service)) => {
                    return downcast::<T>(name, Arc::clone(service));
                }
                Some(ServiceSlot::Prototype(factory)) => {
                    return downcast::<T>(name, factory());
                }
                Some(ServiceSlot::Deferred(_)) => {}
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let (service, memoize) = match slots.get(name) {
            None => return Err(ServiceError::Unregistered(name.to_string())),
            Some(ServiceSlot::Ready(service)) => (Arc::clone(service), false),
            Some(ServiceSlot::Prototype(factory)) => (factory(), false),
            Some(ServiceSlot::Deferred(factory)) => (factory(), true),
        };
        if memoize {
            tracing::debug!("initialized deferred service {}", name);
            slots.insert(name.to_string(), ServiceSlot::Ready(Arc::clone(&service)));
        }
        drop(slots);
        downcast::<T>(name, service)
    }

    pub fn contains(&self, name: &str) -> bool {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.contains_key(name)
    }

    /// Drop a registration. Returns whether the name was registered.
    pub fn remove(&self, name: &str) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, name: String, slot: ServiceSlot) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.insert(name, slot);
    }
}

fn downcast<T: Any + Send + Sync>(name: &str, service: Service) -> Result<Arc<T>, ServiceError> {
    service
        .downcast::<T>()
        .map_err(|_| ServiceError::TypeMismatch {
            name: name.to_string(),
        })
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_map()
            .entries(slots.iter().map(|(name, slot)| (name, slot.kind())))
            .finish()
    }
}
