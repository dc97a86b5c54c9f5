//! Registry of entity types and the adapters compiled for them.
//!
//! Types are registered explicitly; an adapter is compiled the first time it
//! is asked for and cached from then on. The registry only ever grows, and
//! every caller asking for the same type gets the same `Arc`.
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use seahash::SeaHasher;
use tracing::debug;

use crate::adapter::{Adapter, Entity, TableAdapter};
use crate::error::{Result, RowforgeError};

pub type TypeHasher = BuildHasherDefault<SeaHasher>;

lazy_static! {
    static ref GLOBAL: Registry = Registry::new();
}

#[derive(Clone)]
struct Constructed {
    typed: Arc<dyn Any + Send + Sync>,
    erased: Arc<dyn TableAdapter>,
}

#[derive(Clone, Copy)]
struct Registration {
    name: &'static str,
    construct: fn() -> Result<Constructed>,
}

fn construct<T: Entity>() -> Result<Constructed> {
    let adapter = Arc::new(Adapter::<T>::new()?);
    Ok(Constructed {
        typed: adapter.clone(),
        erased: adapter,
    })
}

fn poisoned<E: std::fmt::Display>(e: E) -> RowforgeError {
    RowforgeError::Lock(e.to_string())
}

#[derive(Default)]
pub struct Registry {
    registrations: RwLock<HashMap<TypeId, Registration, TypeHasher>>,
    adapters: RwLock<HashMap<TypeId, Constructed, TypeHasher>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }
    /// Process-wide registry for callers that prefer ambient state.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }
    /// Makes `T` known to the registry. Registering twice is harmless.
    pub fn register<T: Entity>(&self) -> Result<()> {
        let mut registrations = self.registrations.write().map_err(poisoned)?;
        registrations.entry(TypeId::of::<T>()).or_insert_with(|| {
            debug!(entity = type_name::<T>(), "registered");
            Registration {
                name: type_name::<T>(),
                construct: construct::<T>,
            }
        });
        Ok(())
    }
    pub fn is_registered<T: Entity>(&self) -> Result<bool> {
        let registrations = self.registrations.read().map_err(poisoned)?;
        Ok(registrations.contains_key(&TypeId::of::<T>()))
    }
    /// The adapter for `T`, compiled on first use.
    pub fn adapter<T: Entity>(&self) -> Result<Arc<Adapter<T>>> {
        let constructed = self.constructed(TypeId::of::<T>(), type_name::<T>())?;
        constructed.typed.downcast::<Adapter<T>>().map_err(|_| {
            RowforgeError::Configuration(format!(
                "adapter stored for {} has the wrong type",
                type_name::<T>()
            ))
        })
    }
    /// Every registered adapter, ordered by table name.
    pub fn adapters(&self) -> Result<Vec<Arc<dyn TableAdapter>>> {
        let registered: Vec<(TypeId, Registration)> = {
            let registrations = self.registrations.read().map_err(poisoned)?;
            registrations.iter().map(|(id, r)| (*id, *r)).collect()
        };
        let mut adapters = Vec::with_capacity(registered.len());
        for (id, registration) in registered {
            adapters.push(self.constructed(id, registration.name)?.erased);
        }
        adapters.sort_by(|a, b| a.table_name().cmp(b.table_name()));
        Ok(adapters)
    }
    pub fn find_table(&self, table: &str) -> Result<Option<Arc<dyn TableAdapter>>> {
        Ok(self
            .adapters()?
            .into_iter()
            .find(|adapter| adapter.table_name() == table))
    }

    fn constructed(&self, id: TypeId, name: &str) -> Result<Constructed> {
        if let Some(found) = self.adapters.read().map_err(poisoned)?.get(&id) {
            return Ok(found.clone());
        }
        let registration = self
            .registrations
            .read()
            .map_err(poisoned)?
            .get(&id)
            .copied()
            .ok_or_else(|| {
                RowforgeError::Configuration(format!("no adapter registered for {}", name))
            })?;
        // compiled outside the lock; a racing thread's adapter wins if it got there first
        let built = (registration.construct)()?;
        let mut adapters = self.adapters.write().map_err(poisoned)?;
        Ok(adapters.entry(id).or_insert(built).clone())
    }
}
