//! The schema compiler.
//!
//! [`compile`] turns a [`SchemaModel`] into a [`CompiledSchema`]: the CREATE
//! TABLE statement plus one [`ColumnPlan`] per column saying how the column is
//! stored, whether it is written by the encoder and how the decoder reads it.
//! The plans are what [`crate::codegen`] renders into adapter source.
//!
//! Compilation is a pure function of the model, so compiling an unchanged
//! model always produces identical output.

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::ident::quote_identifier;
use crate::schema::{ColumnDescriptor, RelationalKind, SchemaModel};
use crate::sqltype::{resolve, Reader, SqlType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnPlan {
    pub column: ColumnDescriptor,
    pub storage: SqlType,
    pub reader: Reader,
}

impl ColumnPlan {
    /// Whether the column appears in the CREATE TABLE body.
    pub fn in_table(&self) -> bool {
        self.column.kind() != RelationalKind::OneToManyParentField
    }
    /// Whether the encoder writes the column and the decoder reads it.
    pub fn is_mapped(&self) -> bool {
        !self.column.kind().is_relation()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledSchema {
    schema: SchemaModel,
    create_statement: String,
    plans: Vec<ColumnPlan>,
}

impl CompiledSchema {
    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }
    pub fn create_statement(&self) -> &str {
        &self.create_statement
    }
    pub fn plans(&self) -> &[ColumnPlan] {
        &self.plans
    }
    pub fn drop_statement(&self) -> String {
        emit_drop_statement(&self.schema)
    }
}

fn plan(column: &ColumnDescriptor) -> Result<ColumnPlan> {
    let resolved = resolve(column.declared_type()).ok_or_else(|| SchemaError::UnmappedType {
        field: column.field().to_string(),
        declared: column.declared_type().clone(),
    })?;
    Ok(ColumnPlan {
        column: column.clone(),
        storage: resolved.storage,
        reader: resolved.reader,
    })
}

fn plans(schema: &SchemaModel) -> Result<Vec<ColumnPlan>> {
    schema.columns().iter().map(plan).collect()
}

fn create_statement(schema: &SchemaModel, plans: &[ColumnPlan]) -> String {
    let mut clauses = vec![format!(
        "{} INTEGER PRIMARY KEY AUTOINCREMENT",
        quote_identifier(schema.identity_column())
    )];
    // one-to-many lives on the child table, so the parent field adds nothing here
    clauses.extend(
        plans
            .iter()
            .filter(|p| p.in_table())
            .map(|p| format!("{} {}", quote_identifier(p.column.name()), p.storage)),
    );
    format!(
        "CREATE TABLE {} ({});",
        quote_identifier(&schema.table_name()),
        clauses.join(", ")
    )
}

/// `CREATE TABLE <table> (<id> INTEGER PRIMARY KEY AUTOINCREMENT, <name> <TYPE>, ...);`
pub fn emit_create_statement(schema: &SchemaModel) -> Result<String> {
    schema.validate()?;
    Ok(create_statement(schema, &plans(schema)?))
}

pub fn emit_drop_statement(schema: &SchemaModel) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(&schema.table_name()))
}

pub fn compile(schema: &SchemaModel) -> Result<CompiledSchema> {
    schema.validate()?;
    let plans = plans(schema)?;
    let create_statement = create_statement(schema, &plans);
    debug!(target_type = schema.target_type(), columns = plans.len(), "compiled schema");
    Ok(CompiledSchema {
        schema: schema.clone(),
        create_statement,
        plans,
    })
}
