//! Content identifiers: `content://<authority>/<table>[/<id>]`.
//!
//! A collection URI addresses a whole table, a row URI a single row by its
//! identity. [`ContentAccess`] runs untyped row operations against whatever
//! table a URI resolves to, as long as the table belongs to a registered type.
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::adapter::{Entity, TableAdapter};
use crate::error::{Result, RowforgeError};
use crate::gateway::{Gateway, Predicate};
use crate::registry::Registry;
use crate::row::Row;
use crate::value::RowValues;

pub const SCHEME: &str = "content";

lazy_static! {
    static ref CONTENT_URI: Regex =
        Regex::new(r"^content://([^/\s]+)/([A-Za-z_][A-Za-z0-9_]*)(?:/([^/\s]+))?/?$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSelector {
    All,
    Id(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUri {
    authority: String,
    table: String,
    selector: RowSelector,
}

impl ContentUri {
    pub fn collection(authority: &str, table: &str) -> Self {
        Self {
            authority: authority.to_string(),
            table: table.to_string(),
            selector: RowSelector::All,
        }
    }
    pub fn row(authority: &str, table: &str, id: i64) -> Self {
        Self {
            selector: RowSelector::Id(id),
            ..Self::collection(authority, table)
        }
    }
    pub fn parse(uri: &str) -> Result<Self> {
        let unknown = || RowforgeError::UnknownUri(uri.to_string());
        let captures = CONTENT_URI.captures(uri).ok_or_else(unknown)?;
        let selector = match captures.get(3) {
            None => RowSelector::All,
            Some(id) => match id.as_str().parse::<i64>() {
                Ok(id) if id >= 0 => RowSelector::Id(id),
                _ => return Err(unknown()),
            },
        };
        Ok(Self {
            authority: captures[1].to_string(),
            table: captures[2].to_string(),
            selector,
        })
    }
    pub fn authority(&self) -> &str {
        &self.authority
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn selector(&self) -> RowSelector {
        self.selector
    }
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}://{}/{}", SCHEME, self.authority, self.table)?;
        if let RowSelector::Id(id) = self.selector {
            write!(f, "/{}", id)?;
        }
        Ok(())
    }
}

// ------------- Content Access -------------
pub struct ContentAccess<'a, G: Gateway> {
    authority: String,
    registry: &'a Registry,
    gateway: &'a G,
}

impl<'a, G: Gateway> ContentAccess<'a, G> {
    pub fn new(authority: impl Into<String>, registry: &'a Registry, gateway: &'a G) -> Self {
        Self {
            authority: authority.into(),
            registry,
            gateway,
        }
    }
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The collection URI of `T`'s table.
    pub fn content_uri<T: Entity>(&self) -> Result<String> {
        let adapter = self.registry.adapter::<T>()?;
        Ok(ContentUri::collection(&self.authority, adapter.table_name()).to_string())
    }
    pub fn row_uri<T: Entity>(&self, id: i64) -> Result<String> {
        let adapter = self.registry.adapter::<T>()?;
        Ok(ContentUri::row(&self.authority, adapter.table_name(), id).to_string())
    }

    /// Resolves `uri` to the adapter of a registered table and a row selector.
    pub fn resolve(&self, uri: &str) -> Result<(Arc<dyn TableAdapter>, RowSelector)> {
        let parsed = ContentUri::parse(uri)?;
        if parsed.authority() != self.authority {
            return Err(RowforgeError::UnknownUri(uri.to_string()));
        }
        let adapter = self
            .registry
            .find_table(parsed.table())?
            .ok_or_else(|| RowforgeError::UnknownUri(uri.to_string()))?;
        Ok((adapter, parsed.selector()))
    }

    fn collection(&self, uri: &str) -> Result<Arc<dyn TableAdapter>> {
        match self.resolve(uri)? {
            (adapter, RowSelector::All) => Ok(adapter),
            (_, RowSelector::Id(_)) => Err(RowforgeError::UnknownUri(uri.to_string())),
        }
    }

    fn scoped(adapter: &dyn TableAdapter, selector: RowSelector, predicate: &Predicate) -> Predicate {
        match selector {
            RowSelector::All => predicate.clone(),
            RowSelector::Id(id) => {
                Predicate::by_identity(adapter.schema().identity_column(), id).and(predicate.clone())
            }
        }
    }

    /// Inserts into a collection URI and returns the URI of the new row.
    pub fn insert(&self, uri: &str, values: &RowValues) -> Result<String> {
        let adapter = self.collection(uri)?;
        let id = self.gateway.insert_row(adapter.table_name(), values)?;
        debug!(%uri, id, "content inserted");
        Ok(ContentUri::row(&self.authority, adapter.table_name(), id).to_string())
    }
    /// Inserts every row in one transaction and returns how many were written.
    pub fn bulk_insert(&self, uri: &str, rows: &[RowValues]) -> Result<usize> {
        let adapter = self.collection(uri)?;
        let table = adapter.table_name();
        self.gateway.transaction(|tx| {
            for values in rows {
                tx.insert_row(table, values)?;
            }
            Ok(rows.len())
        })
    }
    pub fn query(
        &self,
        uri: &str,
        columns: &[&str],
        predicate: &Predicate,
        order: Option<&str>,
    ) -> Result<Vec<Row>> {
        let (adapter, selector) = self.resolve(uri)?;
        let predicate = Self::scoped(adapter.as_ref(), selector, predicate);
        self.gateway
            .query_rows(adapter.table_name(), columns, &predicate, order)
    }
    pub fn update(&self, uri: &str, values: &RowValues, predicate: &Predicate) -> Result<usize> {
        let (adapter, selector) = self.resolve(uri)?;
        let predicate = Self::scoped(adapter.as_ref(), selector, predicate);
        self.gateway.update_rows(adapter.table_name(), values, &predicate)
    }
    pub fn delete(&self, uri: &str, predicate: &Predicate) -> Result<usize> {
        let (adapter, selector) = self.resolve(uri)?;
        let predicate = Self::scoped(adapter.as_ref(), selector, predicate);
        self.gateway.delete_rows(adapter.table_name(), &predicate)
    }
}
