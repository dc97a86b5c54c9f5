//! rowforge – table schemas compiled from struct definitions, and typed row
//! operations over SQLite.
//!
//! A struct deriving [`Entity`](macro@Entity) has its schema compiled while the
//! crate is built: every field is resolved to a SQLite storage class, and a
//! field without one (a `u64`, a tuple, a reference) is a compile error
//! pointing at that field. The derive emits the encoder and decoder for the
//! struct, and the `CREATE TABLE` statement is derived from the same schema.
//!
//! ## Modules
//! * [`adapter`] – the [`Entity`](trait@Entity) contract and the per-type [`Adapter`].
//! * [`registry`] – explicit registration of entity types; adapters are compiled
//!   once and shared.
//! * [`dispatcher`] – typed create/insert/update/delete/query through a [`Gateway`].
//! * [`gateway`] – the storage operations, implemented for `rusqlite::Connection`.
//! * [`uri`] – `content://<authority>/<table>[/<id>]` addressing of tables and rows.
//! * [`codec`] – the versioned codec for fields stored as opaque blobs.
//! * [`convert`] – date, boolean, char and integer conversions used by the
//!   generated code.
//! * [`settings`] / [`logging`] – runtime configuration and the tracing subscriber.
//! * [`compiler`] – the schema compiler itself (`rowforge-compiler`).
//!
//! ## Storage
//! | field type | column |
//! |---|---|
//! | `i8` `i16` `i32` `i64` `u8` `u16` `u32` `bool` | `INTEGER` (booleans as 1/0) |
//! | `f32` `f64` | `REAL` |
//! | `String` `char` | `TEXT` |
//! | `DateTime<Utc>` | `INTEGER`, epoch milliseconds |
//! | `Vec<u8>` | `BLOB`, as is |
//! | anything else | `BLOB` through [`codec::OpaqueCodec`] |
//!
//! `Option<T>` makes a column nullable. The identity is an `i64` field marked
//! `#[rowforge(id)]` or named `id`, stored as `INTEGER PRIMARY KEY AUTOINCREMENT`.
//!
//! ## Quick Start
//! ```
//! use rusqlite::Connection;
//! use rowforge::{Dispatcher, Entity, Registry};
//!
//! #[derive(Entity, Default, Debug, PartialEq)]
//! struct Note {
//!     id: i64,
//!     title: String,
//!     pinned: bool,
//! }
//!
//! let registry = Registry::new();
//! registry.register::<Note>().unwrap();
//! let conn = Connection::open_in_memory().unwrap();
//! let dispatcher = Dispatcher::new(&registry, &conn);
//! dispatcher.create_table::<Note>().unwrap();
//! let id = dispatcher
//!     .insert(&Note { id: 0, title: "groceries".into(), pinned: true })
//!     .unwrap();
//! let note: Note = dispatcher.find_by_id(id).unwrap().unwrap();
//! assert_eq!(note.title, "groceries");
//! assert!(note.pinned);
//! ```

// generated code names this crate as ::rowforge, including inside it
extern crate self as rowforge;

pub mod adapter;
pub mod codec;
pub mod convert;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod registry;
pub mod row;
pub mod settings;
pub mod uri;
pub mod value;

pub use rowforge_compiler as compiler;
pub use rowforge_derive::Entity;

pub use adapter::{Adapter, Entity, TableAdapter};
pub use codec::OpaqueCodec;
pub use dispatcher::Dispatcher;
pub use error::{Result, RowforgeError};
pub use gateway::{Gateway, Predicate};
pub use registry::Registry;
pub use row::Row;
pub use settings::Settings;
pub use uri::{ContentAccess, ContentUri, RowSelector};
pub use value::{RowValues, Value};
