//! The [`Entity`] contract implemented by `#[derive(Entity)]` and the
//! [`Adapter`] the registry builds from it.
use std::any::type_name;
use std::marker::PhantomData;

use rowforge_compiler::{compile, CompiledSchema, SchemaError, SchemaModel};
use tracing::info;

use crate::error::Result;
use crate::row::Row;
use crate::value::RowValues;

// ------------- Entity -------------
/// A struct mapped onto one table. Usually derived, see [`crate::Entity`](macro@crate::Entity).
///
/// `Default` is the zero-argument constructor decoding starts from: fields
/// not stored in the row (relations) keep their default value.
pub trait Entity: Default + Send + Sync + 'static {
    /// Fully qualified type path; the table name is derived from it.
    fn type_path() -> &'static str;
    fn schema_model() -> std::result::Result<SchemaModel, SchemaError>;
    fn identity(&self) -> i64;
    fn set_identity(&mut self, identity: i64);
    /// Mapped columns in declaration order, without the identity.
    fn encode(&self) -> Result<RowValues>;
    /// Overwrites `target` with the identity and every mapped column of `row`.
    fn map_row(row: &Row, target: &mut Self) -> Result<()>;

    fn decode(row: &Row) -> Result<Self> {
        let mut target = Self::default();
        Self::map_row(row, &mut target)?;
        Ok(target)
    }
}

// ------------- Adapter -------------
/// The compiled schema of one entity type together with its statements.
#[derive(Debug)]
pub struct Adapter<T: Entity> {
    compiled: CompiledSchema,
    table_name: String,
    entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Adapter<T> {
    /// Compiles `T`'s schema model. Fails with the compiler's error when a
    /// field has no SQL mapping.
    pub fn new() -> Result<Self> {
        let schema = T::schema_model()?;
        let compiled = compile(&schema)?;
        let table_name = schema.table_name();
        info!(entity = type_name::<T>(), table = %table_name, "adapter constructed");
        Ok(Self {
            compiled,
            table_name,
            entity: PhantomData,
        })
    }
    pub fn schema(&self) -> &SchemaModel {
        self.compiled.schema()
    }
    pub fn compiled(&self) -> &CompiledSchema {
        &self.compiled
    }
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
    pub fn identity_column(&self) -> &str {
        self.schema().identity_column()
    }
    pub fn create_statement(&self) -> &str {
        self.compiled.create_statement()
    }
    pub fn drop_statement(&self) -> String {
        self.compiled.drop_statement()
    }
    /// Columns a query has to select to decode a `T`.
    pub fn selected_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.identity_column()];
        columns.extend(
            self.compiled
                .plans()
                .iter()
                .filter(|p| p.in_table())
                .map(|p| p.column.name()),
        );
        columns
    }
    pub fn encode(&self, entity: &T) -> Result<RowValues> {
        entity.encode()
    }
    pub fn decode(&self, row: &Row) -> Result<T> {
        T::decode(row)
    }
}

/// Type-erased view of an adapter, for listing what a registry holds.
pub trait TableAdapter: Send + Sync {
    fn entity_name(&self) -> &'static str;
    fn table_name(&self) -> &str;
    fn create_statement(&self) -> &str;
    fn schema(&self) -> &SchemaModel;
}

impl<T: Entity> TableAdapter for Adapter<T> {
    fn entity_name(&self) -> &'static str {
        type_name::<T>()
    }
    fn table_name(&self) -> &str {
        &self.table_name
    }
    fn create_statement(&self) -> &str {
        self.compiled.create_statement()
    }
    fn schema(&self) -> &SchemaModel {
        self.compiled.schema()
    }
}
