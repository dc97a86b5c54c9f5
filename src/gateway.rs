// Storage gateway: the handful of SQL operations the dispatcher needs.
use rowforge_compiler::quote_identifier;
use rusqlite::{params_from_iter, Connection};
use tracing::trace;

use crate::error::{Result, RowforgeError};
use crate::row::Row;
use crate::value::{RowValues, Value};

// ------------- Predicate -------------
/// A WHERE clause with `?` placeholders and the values bound to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clause: Option<String>,
    args: Vec<Value>,
}

impl Predicate {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }
    pub fn new(clause: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            clause: Some(clause.into()),
            args,
        }
    }
    /// `column = ?`, with the column name quoted where SQL needs it.
    pub fn column_equals(column: &str, value: Value) -> Self {
        Self::new(format!("{} = ?", quote_identifier(column)), vec![value])
    }
    pub fn by_identity(identity_column: &str, id: i64) -> Self {
        Self::column_equals(identity_column, Value::Integer(id))
    }
    pub fn clause(&self) -> Option<&str> {
        self.clause.as_deref()
    }
    pub fn args(&self) -> &[Value] {
        &self.args
    }
    /// Both predicates must hold.
    pub fn and(self, other: Predicate) -> Self {
        match (self.clause, other.clause) {
            (None, None) => Self::all(),
            (Some(clause), None) => Self::new(clause, self.args),
            (None, Some(clause)) => Self::new(clause, other.args),
            (Some(left), Some(right)) => {
                let mut args = self.args;
                args.extend(other.args);
                Self::new(format!("({}) AND ({})", left, right), args)
            }
        }
    }
    fn where_sql(&self) -> String {
        match &self.clause {
            Some(clause) => format!(" WHERE {}", clause),
            None => String::new(),
        }
    }
}

// ------------- Gateway -------------
pub trait Gateway {
    fn execute(&self, sql: &str) -> Result<()>;
    /// Returns the identity assigned to the new row.
    fn insert_row(&self, table: &str, values: &RowValues) -> Result<i64>;
    fn update_rows(&self, table: &str, values: &RowValues, predicate: &Predicate) -> Result<usize>;
    fn delete_rows(&self, table: &str, predicate: &Predicate) -> Result<usize>;
    fn query_rows(
        &self,
        table: &str,
        columns: &[&str],
        predicate: &Predicate,
        order: Option<&str>,
    ) -> Result<Vec<Row>>;
    fn raw_query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>>;
    /// Runs `work` in a transaction, committing only if it succeeds.
    fn transaction<R>(&self, work: impl FnOnce(&Self) -> Result<R>) -> Result<R>
    where
        Self: Sized;
}

fn column_list<'c>(columns: impl Iterator<Item = &'c str>) -> String {
    columns.map(quote_identifier).collect::<Vec<_>>().join(", ")
}

fn select_sql(table: &str, columns: &[&str], predicate: &Predicate, order: Option<&str>) -> String {
    let projection = if columns.is_empty() {
        String::from("*")
    } else {
        column_list(columns.iter().copied())
    };
    let mut sql = format!(
        "SELECT {} FROM {}{}",
        projection,
        quote_identifier(table),
        predicate.where_sql()
    );
    if let Some(order) = order {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }
    sql
}

impl Gateway for Connection {
    fn execute(&self, sql: &str) -> Result<()> {
        trace!(%sql, "execute");
        self.execute_batch(sql)?;
        Ok(())
    }

    fn insert_row(&self, table: &str, values: &RowValues) -> Result<i64> {
        let sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table))
        } else {
            let placeholders = vec!["?"; values.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_identifier(table),
                column_list(values.columns()),
                placeholders
            )
        };
        trace!(%sql, "insert");
        let mut stmt = self.prepare_cached(&sql)?;
        stmt.execute(params_from_iter(values.values()))?;
        Ok(self.last_insert_rowid())
    }

    fn update_rows(&self, table: &str, values: &RowValues, predicate: &Predicate) -> Result<usize> {
        if values.is_empty() {
            return Ok(0);
        }
        let assignments: Vec<String> = values
            .columns()
            .map(|c| format!("{} = ?", quote_identifier(c)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {}{}",
            quote_identifier(table),
            assignments.join(", "),
            predicate.where_sql()
        );
        trace!(%sql, "update");
        let mut stmt = self.prepare(&sql)?;
        Ok(stmt.execute(params_from_iter(values.values().chain(predicate.args())))?)
    }

    fn delete_rows(&self, table: &str, predicate: &Predicate) -> Result<usize> {
        let sql = format!("DELETE FROM {}{}", quote_identifier(table), predicate.where_sql());
        trace!(%sql, "delete");
        let mut stmt = self.prepare(&sql)?;
        Ok(stmt.execute(params_from_iter(predicate.args()))?)
    }

    fn query_rows(
        &self,
        table: &str,
        columns: &[&str],
        predicate: &Predicate,
        order: Option<&str>,
    ) -> Result<Vec<Row>> {
        self.raw_query(&select_sql(table, columns, predicate, order), predicate.args())
    }

    fn raw_query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
        trace!(%sql, "query");
        let mut stmt = self.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(args))?;
        let mut materialized = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                let value = Value::try_from(row.get_ref(i)?)
                    .map_err(|e| RowforgeError::decode(name, format!("invalid UTF-8 in TEXT: {}", e)))?;
                values.push(value);
            }
            materialized.push(Row::new(names.clone(), values));
        }
        Ok(materialized)
    }

    fn transaction<R>(&self, work: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        let tx = self.unchecked_transaction()?;
        // dropping the transaction without commit rolls it back
        let result = work(&*tx)?;
        tx.commit()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        Gateway::execute(&conn, "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, n INTEGER);")
            .expect("create");
        conn
    }

    #[test]
    fn insert_query_update_delete() {
        let conn = connection();
        let mut values = RowValues::new();
        values.put("name", Value::from("a"));
        values.put("n", Value::from(1));
        let first = conn.insert_row("t", &values).expect("insert");
        let second = conn.insert_row("t", &values).expect("insert");
        assert_eq!((first, second), (1, 2));

        let mut change = RowValues::new();
        change.put("n", Value::from(5));
        let updated = conn
            .update_rows("t", &change, &Predicate::by_identity("id", second))
            .expect("update");
        assert_eq!(updated, 1);

        let rows = conn
            .query_rows("t", &["id", "n"], &Predicate::all(), Some("id"))
            .expect("query");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].integer("n").expect("n"), 5);

        let deleted = conn
            .delete_rows("t", &Predicate::new("n = ?", vec![Value::from(1)]))
            .expect("delete");
        assert_eq!(deleted, 1);
    }

    #[test]
    fn empty_values_insert_defaults() {
        let conn = connection();
        let id = conn.insert_row("t", &RowValues::new()).expect("insert");
        let rows = conn.raw_query("SELECT name FROM t WHERE id = ?", &[Value::from(id)]).expect("query");
        assert_eq!(rows[0].optional_text("name").expect("name"), None);
    }

    #[test]
    fn failed_transactions_roll_back() {
        let conn = connection();
        let result: Result<()> = Gateway::transaction(&conn, |tx| {
            tx.insert_row("t", &RowValues::new())?;
            tx.insert_row("missing", &RowValues::new())?;
            Ok(())
        });
        assert!(result.is_err());
        let rows = conn.raw_query("SELECT * FROM t", &[]).expect("query");
        assert!(rows.is_empty());
    }

    #[test]
    fn keyword_columns_are_quoted() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        Gateway::execute(&conn, r#"CREATE TABLE "group" (id INTEGER PRIMARY KEY AUTOINCREMENT, "order" INTEGER);"#)
            .expect("create");
        let mut values = RowValues::new();
        values.put("order", Value::from(3));
        let id = conn.insert_row("group", &values).expect("insert");
        let mut change = RowValues::new();
        change.put("order", Value::from(4));
        conn.update_rows("group", &change, &Predicate::column_equals("order", Value::from(3)))
            .expect("update");
        let rows = conn
            .query_rows("group", &["id", "order"], &Predicate::by_identity("id", id), None)
            .expect("query");
        assert_eq!(rows[0].integer("order").expect("order"), 4);
        assert_eq!(conn.delete_rows("group", &Predicate::all()).expect("delete"), 1);
    }

    #[test]
    fn invalid_utf8_text_is_a_decode_error() {
        let conn = connection();
        Gateway::execute(&conn, "INSERT INTO t (name) VALUES (CAST(x'66ff6f' AS TEXT));").expect("insert");
        let err = conn.raw_query("SELECT name FROM t", &[]).unwrap_err();
        assert!(
            matches!(&err, RowforgeError::Decode { column, .. } if column == "name"),
            "{err}"
        );
    }

    #[test]
    fn predicates_combine() {
        let p = Predicate::by_identity("id", 3).and(Predicate::new("n > ?", vec![Value::from(1)]));
        assert_eq!(p.clause(), Some("(id = ?) AND (n > ?)"));
        assert_eq!(p.args(), &[Value::Integer(3), Value::Integer(1)]);
        assert_eq!(Predicate::all().and(Predicate::all()), Predicate::all());
    }
}
