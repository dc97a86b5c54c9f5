//! rowforge-compiler – the schema compiler behind `#[derive(Entity)]`.
//!
//! The pipeline is a chain of pure functions:
//! * [`schema`] – [`ColumnDescriptor`] and [`SchemaModel`], the description of one struct.
//! * [`sqltype`] – the resolver mapping a [`DeclaredType`] onto a SQLite storage
//!   class and the row accessor that reads it back.
//! * [`compiler`] – validates a model, resolves every column and emits the
//!   `CREATE TABLE` statement and per-column plans.
//! * [`ident`] – quoting of table and column names that clash with SQL.
//! * [`codegen`] – renders the plans as the Rust source of an `Entity` impl.
//!
//! Nothing here performs I/O, so every stage can be tested against golden output.
//!
//! ```
//! use rowforge_compiler::{compile, ColumnDescriptor, DeclaredType, SchemaModel};
//! let schema = SchemaModel::builder("library::Book")
//!     .column(ColumnDescriptor::new("title", DeclaredType::Text))
//!     .build()
//!     .unwrap();
//! let compiled = compile(&schema).unwrap();
//! assert_eq!(
//!     compiled.create_statement(),
//!     "CREATE TABLE library_Book (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT);"
//! );
//! ```

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod ident;
pub mod schema;
pub mod sqltype;

pub use codegen::render_adapter;
pub use compiler::{compile, emit_create_statement, emit_drop_statement, ColumnPlan, CompiledSchema};
pub use error::SchemaError;
pub use ident::quote_identifier;
pub use schema::{table_name, ColumnDescriptor, DeclaredType, RelationalKind, SchemaBuilder, SchemaModel};
pub use sqltype::{resolve, Reader, Resolved, SqlType};
