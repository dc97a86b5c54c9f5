//! Column descriptors and the per-struct schema model.
//!
//! A [`SchemaModel`] is the only input the compiler accepts. It is built once,
//! either by the derive macro from a struct definition or by hand (tests, the
//! command-line driver reading JSON), and is immutable afterwards.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

// ------------- Declared Type -------------
/// The semantic type of a mapped field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclaredType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    Boolean,
    Float32,
    Float64,
    Char,
    Text,
    DateTime,
    Bytes,
    /// Any other type; stored through its opaque codec.
    Object(String),
    /// Reference to one row of another mapped type.
    OneToOne(String),
    /// Collection of rows of another mapped type.
    OneToMany(String),
    /// A type the resolver refuses to map (wide unsigned integers, tuples, references...).
    Unsupported(String),
}

impl DeclaredType {
    /// Rust spelling of the type, used in diagnostics.
    pub fn rust_name(&self) -> &str {
        match self {
            DeclaredType::Int8 => "i8",
            DeclaredType::Int16 => "i16",
            DeclaredType::Int32 => "i32",
            DeclaredType::Int64 => "i64",
            DeclaredType::UInt8 => "u8",
            DeclaredType::UInt16 => "u16",
            DeclaredType::UInt32 => "u32",
            DeclaredType::Boolean => "bool",
            DeclaredType::Float32 => "f32",
            DeclaredType::Float64 => "f64",
            DeclaredType::Char => "char",
            DeclaredType::Text => "String",
            DeclaredType::DateTime => "DateTime<Utc>",
            DeclaredType::Bytes => "Vec<u8>",
            DeclaredType::Object(path)
            | DeclaredType::OneToOne(path)
            | DeclaredType::OneToMany(path)
            | DeclaredType::Unsupported(path) => path,
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeclaredType::OneToOne(path) => write!(f, "one-to-one {}", path),
            DeclaredType::OneToMany(path) => write!(f, "one-to-many {}", path),
            _ => write!(f, "{}", self.rust_name()),
        }
    }
}

// ------------- Relational Kind -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationalKind {
    Scalar,
    Date,
    BlobOpaque,
    BlobRaw,
    OneToOne,
    OneToManyParentField,
    OneToManyChildMarker,
}

impl RelationalKind {
    /// The kind implied by a declared type. The child marker is never implied,
    /// it is only introduced by [`SchemaBuilder::child_of`].
    pub fn of(declared: &DeclaredType) -> Self {
        match declared {
            DeclaredType::DateTime => RelationalKind::Date,
            DeclaredType::Bytes => RelationalKind::BlobRaw,
            DeclaredType::Object(_) => RelationalKind::BlobOpaque,
            DeclaredType::OneToOne(_) => RelationalKind::OneToOne,
            DeclaredType::OneToMany(_) => RelationalKind::OneToManyParentField,
            _ => RelationalKind::Scalar,
        }
    }
    /// Relation kinds are neither encoded nor decoded by the adapter.
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            RelationalKind::OneToOne
                | RelationalKind::OneToManyParentField
                | RelationalKind::OneToManyChildMarker
        )
    }
}

// ------------- Column Descriptor -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    declared_type: DeclaredType,
    kind: RelationalKind,
    #[serde(default)]
    nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        let kind = RelationalKind::of(&declared_type);
        Self {
            name: name.into(),
            field: None,
            declared_type,
            kind,
            nullable: false,
        }
    }
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
    /// Maps the column onto a differently named struct field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.field = if field == self.name { None } else { Some(field) };
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn field(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.name)
    }
    pub fn declared_type(&self) -> &DeclaredType {
        &self.declared_type
    }
    pub fn kind(&self) -> RelationalKind {
        self.kind
    }
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

// ------------- Schema Model -------------
/// Replaces every path separator of a type path with `_`.
pub fn table_name(target_type: &str) -> String {
    target_type.replace("::", "_").replace('.', "_")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModel {
    target_type: String,
    identity_column: String,
    columns: Vec<ColumnDescriptor>,
    /// Set when this schema is the "many" side of a one-to-many relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_type: Option<String>,
}

impl SchemaModel {
    pub fn builder(target_type: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            target_type: target_type.into(),
            identity_column: String::from("id"),
            columns: Vec::new(),
            parent: None,
        }
    }
    pub fn target_type(&self) -> &str {
        &self.target_type
    }
    pub fn table_name(&self) -> String {
        table_name(&self.target_type)
    }
    pub fn identity_column(&self) -> &str {
        &self.identity_column
    }
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
    pub fn is_child_table(&self) -> bool {
        self.parent_type.is_some()
    }
    pub fn parent_type(&self) -> Option<&str> {
        self.parent_type.as_deref()
    }
    /// The reverse reference column of a child table, if there is one.
    pub fn parent_reference(&self) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.kind == RelationalKind::OneToManyChildMarker)
    }
    /// Checks the structural invariants. Type mapping is checked by the compiler.
    pub fn validate(&self) -> Result<()> {
        if self.target_type.trim().is_empty() {
            return Err(SchemaError::EmptyTarget);
        }
        if self.identity_column.trim().is_empty() {
            return Err(SchemaError::EmptyIdentity {
                target: self.target_type.clone(),
            });
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name == self.identity_column {
                return Err(SchemaError::IdentityCollision {
                    target: self.target_type.clone(),
                    column: column.name.clone(),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    target: self.target_type.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    target_type: String,
    identity_column: String,
    columns: Vec<ColumnDescriptor>,
    parent: Option<String>,
}

impl SchemaBuilder {
    pub fn identity(mut self, name: impl Into<String>) -> Self {
        self.identity_column = name.into();
        self
    }
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }
    /// Marks the schema as the "many" side of a relation owned by `parent`.
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
    pub fn build(self) -> Result<SchemaModel> {
        let mut columns = self.columns;
        if let Some(parent) = &self.parent {
            // the reverse reference always goes last so the declared order is kept
            let reference = format!("{}_id", table_name(parent));
            columns.push(ColumnDescriptor {
                name: reference,
                field: None,
                declared_type: DeclaredType::Int64,
                kind: RelationalKind::OneToManyChildMarker,
                nullable: true,
            });
        }
        let schema = SchemaModel {
            target_type: self.target_type,
            identity_column: self.identity_column,
            columns,
            parent_type: self.parent,
        };
        schema.validate()?;
        Ok(schema)
    }
}
