//! Process-scoped dependency container and action initializers.
//!
//! Registrations are keyed by type. A value is either an instance that is
//! cloned out on every resolve, or a lazy factory that runs at first resolve
//! and is cached from then on. Trait objects are registered behind an `Arc`
//! (`Arc<dyn Console>`), so resolving them is a reference-count bump.

use crate::errors::{ActionError, ContainerError};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type AnyValue = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&Container) -> anyhow::Result<AnyValue> + Send + Sync>;

#[derive(Clone)]
enum Entry {
    Instance(AnyValue),
    Lazy(Factory),
}

#[derive(Default)]
pub struct Container {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ready-made value. Replaces any previous registration for `T`.
    pub fn register_instance<T>(&self, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(TypeId::of::<T>(), Entry::Instance(Arc::new(value)));
    }

    /// Register a factory that builds `T` on first resolve.
    ///
    /// The factory receives the container so it can resolve its own
    /// dependencies. It runs without the registry lock held.
    pub fn register_lazy<T, F>(&self, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |c| Ok(Arc::new(factory(c)?) as AnyValue));
        self.insert(TypeId::of::<T>(), Entry::Lazy(factory));
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&TypeId::of::<T>())
    }

    /// Resolve a clone of the registered `T`.
    pub fn resolve<T>(&self) -> Result<T, ContainerError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = TypeId::of::<T>();
        let entry = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned()
            .ok_or(ContainerError::NotRegistered {
                type_name: type_name::<T>(),
            })?;

        let value = match entry {
            Entry::Instance(value) => value,
            Entry::Lazy(factory) => {
                let value = factory(self).map_err(|source| ContainerError::Resolve {
                    type_name: type_name::<T>(),
                    source,
                })?;
                tracing::trace!(type_name = type_name::<T>(), "lazy registration resolved");
                self.insert(key, Entry::Instance(value.clone()));
                value
            }
        };

        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or(ContainerError::NotRegistered {
                type_name: type_name::<T>(),
            })
    }

    fn insert(&self, key: TypeId, entry: Entry) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, entry);
    }
}

/// Construction of an action from the container.
pub trait FromContainer: Sized {
    fn from_container(container: &Arc<Container>) -> Result<Self, ContainerError>;
}

type Build<A> = Arc<dyn Fn() -> Result<A, ContainerError> + Send + Sync>;

/// Zero-argument factory for a fully wired action.
///
/// Nothing is resolved until [`initialize`](Self::initialize) is called, so
/// a composite can hold initializers for steps that may never run.
pub struct ActionInitializer<A> {
    action: &'static str,
    build: Build<A>,
}

impl<A> Clone for ActionInitializer<A> {
    fn clone(&self) -> Self {
        Self {
            action: self.action,
            build: self.build.clone(),
        }
    }
}

impl<A> ActionInitializer<A> {
    pub fn new<F>(action: &'static str, build: F) -> Self
    where
        F: Fn() -> Result<A, ContainerError> + Send + Sync + 'static,
    {
        Self {
            action,
            build: Arc::new(build),
        }
    }

    pub fn action_name(&self) -> &'static str {
        self.action
    }

    /// Build the action, mapping any resolution failure to
    /// [`ActionError::Initialization`].
    pub fn initialize(&self) -> Result<A, ActionError> {
        (self.build)().map_err(|source| ActionError::Initialization {
            action: self.action,
            source,
        })
    }
}

impl<A: FromContainer + 'static> ActionInitializer<A> {
    /// An initializer that resolves `A` from `container` at call time.
    pub fn from_container(action: &'static str, container: &Arc<Container>) -> Self {
        let container = Arc::clone(container);
        Self::new(action, move || A::from_container(&container))
    }
}
