//! Component registration and lookup.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use tracing::{debug, warn};

use super::{BackendComponent, COMPONENTS_TARGET, ComponentError, ComponentId};

type Constructor = Box<dyn Fn() -> ComponentInstance + Send + Sync>;

/// Entry in the explicit list of components a backend runs.
///
/// # Example
///
/// ```
/// use easeld::{BackendComponent, ComponentRegistration, ComponentRegistry};
///
/// #[derive(Default)]
/// struct Chat;
///
/// impl BackendComponent for Chat {}
///
/// let registry = ComponentRegistry::discover(vec![ComponentRegistration::of::<Chat>()])
///     .expect("discovery succeeds");
/// assert!(registry.get::<Chat>().is_ok());
/// ```
pub struct ComponentRegistration {
    id: ComponentId,
    construct: Constructor,
}

impl ComponentRegistration {
    /// Registers `T`, built with its [`Default`] implementation.
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: BackendComponent + Default,
    {
        Self::with_constructor(T::default)
    }

    /// Registers `T`, built by `constructor`.
    #[must_use]
    pub fn with_constructor<T, F>(constructor: F) -> Self
    where
        T: BackendComponent,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            id: ComponentId::of::<T>(),
            construct: Box::new(move || ComponentInstance::new(constructor())),
        }
    }

    /// Identity of the registered type.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }
}

struct ComponentInstance {
    component: Arc<dyn BackendComponent>,
    any: Arc<dyn Any + Send + Sync>,
}

impl ComponentInstance {
    fn new<T: BackendComponent>(value: T) -> Self {
        let shared = Arc::new(value);
        Self {
            component: Arc::clone(&shared) as Arc<dyn BackendComponent>,
            any: shared,
        }
    }
}

/// A live component together with its lifecycle state.
pub struct ComponentRecord {
    id: ComponentId,
    component: Arc<dyn BackendComponent>,
    any: Arc<dyn Any + Send + Sync>,
    initialized: AtomicBool,
}

impl ComponentRecord {
    /// Identity of the component.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The component instance.
    #[must_use]
    pub fn component(&self) -> &Arc<dyn BackendComponent> {
        &self.component
    }

    /// Whether `initiate` has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }
}

/// Table of every component instance, one per type.
#[derive(Default)]
pub struct ComponentRegistry {
    records: RwLock<Vec<Arc<ComponentRecord>>>,
}

impl ComponentRegistry {
    /// Instantiates every registration, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Duplicate`] when a type appears twice.
    pub fn discover(registrations: Vec<ComponentRegistration>) -> Result<Self, ComponentError> {
        let mut records: Vec<Arc<ComponentRecord>> = Vec::with_capacity(registrations.len());
        for registration in registrations {
            if records.iter().any(|record| record.id == registration.id) {
                return Err(ComponentError::Duplicate {
                    component: registration.id.name(),
                });
            }
            let ComponentInstance { component, any } = (registration.construct)();
            debug!(
                target: COMPONENTS_TARGET,
                component = %registration.id,
                "component registered"
            );
            records.push(Arc::new(ComponentRecord {
                id: registration.id,
                component,
                any,
                initialized: AtomicBool::new(false),
            }));
        }
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    /// Returns the instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::NotFound`] when `T` is not registered.
    pub fn get<T: BackendComponent>(&self) -> Result<Arc<T>, ComponentError> {
        let id = ComponentId::of::<T>();
        self.record(id)
            .and_then(|record| Arc::clone(&record.any).downcast::<T>().ok())
            .ok_or(ComponentError::NotFound {
                component: id.name(),
            })
    }

    /// Point-in-time snapshot of every record, in registration order.
    #[must_use]
    pub fn records(&self) -> Vec<Arc<ComponentRecord>> {
        self.read().clone()
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub(crate) fn record(&self, id: ComponentId) -> Option<Arc<ComponentRecord>> {
        self.read()
            .iter()
            .find(|record| record.id.type_id() == id.type_id())
            .map(Arc::clone)
    }

    /// Runs every component's safety check, returning the failures.
    ///
    /// Each failure is logged; the remaining checks still run.
    pub fn safety_check_all(&self) -> Vec<ComponentError> {
        let mut failures = Vec::new();
        for record in self.records() {
            if let Err(source) = record.component.safety_check() {
                let error = ComponentError::SafetyCheck {
                    component: record.id.name(),
                    source,
                };
                warn!(target: COMPONENTS_TARGET, error = %error, "safety check failed");
                failures.push(error);
            }
        }
        failures
    }

    /// Unloads every component and empties the table.
    ///
    /// Each failure is logged; the remaining unloads still run.
    pub fn unload_all(&self) -> Vec<ComponentError> {
        let records = std::mem::take(
            &mut *self
                .records
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut failures = Vec::new();
        for record in records {
            match record.component.unload() {
                Ok(()) => debug!(
                    target: COMPONENTS_TARGET,
                    component = %record.id,
                    "component unloaded"
                ),
                Err(source) => {
                    let error = ComponentError::Unload {
                        component: record.id.name(),
                        source,
                    };
                    warn!(target: COMPONENTS_TARGET, error = %error, "unload failed");
                    failures.push(error);
                }
            }
        }
        failures
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<ComponentRecord>>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }
}
