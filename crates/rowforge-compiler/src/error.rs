use thiserror::Error;

use crate::schema::DeclaredType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema has no target type")]
    EmptyTarget,
    #[error("Schema for {target} has no identity column")]
    EmptyIdentity { target: String },
    #[error("Column '{column}' is declared more than once on {target}")]
    DuplicateColumn { target: String, column: String },
    #[error("Column '{column}' on {target} collides with the identity column")]
    IdentityCollision { target: String, column: String },
    #[error("Field '{field}' has type {declared} which has no SQL mapping")]
    UnmappedType { field: String, declared: DeclaredType },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
