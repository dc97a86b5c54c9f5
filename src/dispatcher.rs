//! Typed table operations routed through the registry's adapters.
//!
//! A [`Dispatcher`] pairs a [`Registry`] with a [`Gateway`]. Every operation
//! looks up the adapter of its entity type first, so using a type that was
//! never registered fails with a configuration error before any SQL runs.
//!
//! Relations are never followed implicitly. A child row is written with
//! [`Dispatcher::insert_child`], which fills in the reverse reference column,
//! and read back with [`Dispatcher::query_children`].
use std::any::type_name;
use std::sync::Arc;

use rowforge_compiler::quote_identifier;
use tracing::{debug, info, warn};

use crate::adapter::{Adapter, Entity};
use crate::error::{Result, RowforgeError};
use crate::gateway::{Gateway, Predicate};
use crate::registry::Registry;
use crate::row::Row;
use crate::value::{RowValues, Value};

pub struct Dispatcher<'a, G: Gateway> {
    registry: &'a Registry,
    gateway: &'a G,
}

impl<'a, G: Gateway> Dispatcher<'a, G> {
    pub fn new(registry: &'a Registry, gateway: &'a G) -> Self {
        Self { registry, gateway }
    }
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }
    pub fn gateway(&self) -> &'a G {
        self.gateway
    }
    pub fn adapter<T: Entity>(&self) -> Result<Arc<Adapter<T>>> {
        self.registry.adapter::<T>()
    }

    // ------------- Schema -------------
    pub fn create_table<T: Entity>(&self) -> Result<()> {
        let adapter = self.adapter::<T>()?;
        self.gateway.execute(adapter.create_statement())?;
        info!(table = adapter.table_name(), "table created");
        Ok(())
    }
    pub fn drop_table<T: Entity>(&self) -> Result<()> {
        let adapter = self.adapter::<T>()?;
        self.gateway.execute(&adapter.drop_statement())?;
        info!(table = adapter.table_name(), "table dropped");
        Ok(())
    }
    /// Creates the table of every registered type.
    pub fn create_all(&self) -> Result<usize> {
        let adapters = self.registry.adapters()?;
        for adapter in &adapters {
            self.gateway.execute(adapter.create_statement())?;
            info!(table = adapter.table_name(), "table created");
        }
        Ok(adapters.len())
    }

    // ------------- Mapping -------------
    pub fn table_name<T: Entity>(&self) -> Result<String> {
        Ok(self.adapter::<T>()?.table_name().to_string())
    }
    pub fn to_values<T: Entity>(&self, entity: &T) -> Result<RowValues> {
        self.adapter::<T>()?.encode(entity)
    }
    pub fn from_row<T: Entity>(&self, row: &Row) -> Result<T> {
        self.adapter::<T>()?.decode(row)
    }

    // ------------- Writes -------------
    /// Inserts one row and returns the identity the database assigned.
    pub fn insert<T: Entity>(&self, entity: &T) -> Result<i64> {
        let adapter = self.adapter::<T>()?;
        let values = adapter.encode(entity)?;
        let id = self.gateway.insert_row(adapter.table_name(), &values)?;
        debug!(table = adapter.table_name(), id, "inserted");
        Ok(id)
    }

    /// Inserts every entity in one transaction. Either all rows are written
    /// and their count is returned, or none are.
    pub fn insert_all<T: Entity>(&self, entities: &[T]) -> Result<usize> {
        let adapter = self.adapter::<T>()?;
        let table = adapter.table_name();
        let outcome = self.gateway.transaction(|tx| {
            for entity in entities {
                tx.insert_row(table, &adapter.encode(entity)?)?;
            }
            Ok(entities.len())
        });
        match outcome {
            Ok(count) => {
                debug!(table, count, "batch committed");
                Ok(count)
            }
            Err(e) => {
                warn!(table, error = %e, "batch rolled back");
                Err(e)
            }
        }
    }

    pub fn update<T: Entity>(&self, values: &RowValues, predicate: &Predicate) -> Result<usize> {
        let adapter = self.adapter::<T>()?;
        self.gateway.update_rows(adapter.table_name(), values, predicate)
    }
    /// Writes every mapped column of `entity` to the row with its identity.
    pub fn update_entity<T: Entity>(&self, entity: &T) -> Result<usize> {
        let adapter = self.adapter::<T>()?;
        let predicate = Predicate::by_identity(adapter.identity_column(), entity.identity());
        self.gateway
            .update_rows(adapter.table_name(), &adapter.encode(entity)?, &predicate)
    }
    pub fn delete<T: Entity>(&self, predicate: &Predicate) -> Result<usize> {
        let adapter = self.adapter::<T>()?;
        self.gateway.delete_rows(adapter.table_name(), predicate)
    }

    // ------------- Reads -------------
    /// Runs `sql` and decodes every row as a `T`. Results are fully
    /// materialized; a row that fails to decode fails the whole query.
    pub fn query<T: Entity>(&self, sql: &str, args: &[Value]) -> Result<Vec<T>> {
        let adapter = self.adapter::<T>()?;
        self.gateway
            .raw_query(sql, args)?
            .iter()
            .map(|row| adapter.decode(row))
            .collect()
    }
    pub fn query_table<T: Entity>(&self, predicate: &Predicate, order: Option<&str>) -> Result<Vec<T>> {
        let adapter = self.adapter::<T>()?;
        let columns = adapter.selected_columns();
        self.gateway
            .query_rows(adapter.table_name(), &columns, predicate, order)?
            .iter()
            .map(|row| adapter.decode(row))
            .collect()
    }
    pub fn find_by_id<T: Entity>(&self, id: i64) -> Result<Option<T>> {
        let adapter = self.adapter::<T>()?;
        let predicate = Predicate::by_identity(adapter.identity_column(), id);
        Ok(self.query_table::<T>(&predicate, None)?.into_iter().next())
    }

    // ------------- Relations -------------
    fn parent_reference<C: Entity>(adapter: &Adapter<C>) -> Result<String> {
        adapter
            .schema()
            .parent_reference()
            .map(|c| c.name().to_string())
            .ok_or_else(|| {
                RowforgeError::Configuration(format!(
                    "{} is not declared as a child of another entity",
                    type_name::<C>()
                ))
            })
    }
    /// Inserts `child` as a row belonging to the parent row `parent_id`.
    pub fn insert_child<C: Entity>(&self, parent_id: i64, child: &C) -> Result<i64> {
        let adapter = self.adapter::<C>()?;
        let reference = Self::parent_reference(&adapter)?;
        let mut values = adapter.encode(child)?;
        values.put(&reference, Value::Integer(parent_id));
        self.gateway.insert_row(adapter.table_name(), &values)
    }
    /// The children of the parent row `parent_id`, in insertion order.
    pub fn query_children<C: Entity>(&self, parent_id: i64) -> Result<Vec<C>> {
        let adapter = self.adapter::<C>()?;
        let reference = Self::parent_reference(&adapter)?;
        let predicate = Predicate::column_equals(&reference, Value::Integer(parent_id));
        let order = quote_identifier(adapter.identity_column());
        self.query_table::<C>(&predicate, Some(order.as_ref()))
    }
}
