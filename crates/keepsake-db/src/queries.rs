use crate::record::{Collection, Order, Record};
use crate::Database;
use anyhow::Result;
use rusqlite::types::ToSql;
use rusqlite::Connection;
use tracing::debug;

impl Database {
    /// Store a new record under a freshly assigned key and return the key.
    /// Any key already on the record is ignored.
    pub fn add<R: Record<Key = i64>>(&self, record: &R) -> Result<i64> {
        self.with_conn_mut(|conn| insert(conn, record))
    }

    /// Add several records in one transaction. Either all are stored or none.
    pub fn add_many<R: Record<Key = i64>>(&self, records: &[R]) -> Result<Vec<i64>> {
        self.atomically(|tx| records.iter().map(|r| insert(tx, r)).collect())
    }

    /// Insert or replace by key. A record without a key is added.
    pub fn put<R: Record>(&self, record: &R) -> Result<()> {
        self.with_conn_mut(|conn| upsert(conn, record))
    }

    pub fn get<R: Record>(&self, key: &R::Key) -> Result<Option<R>> {
        self.with_conn(|conn| get(conn, key))
    }

    /// Remove a record. Returns whether it existed; a missing key is not an error.
    pub fn delete<R: Record>(&self, key: &R::Key) -> Result<bool> {
        self.with_conn_mut(|conn| delete(conn, R::COLLECTION, key))
    }

    /// Every record in the collection, optionally ordered by its index.
    /// Ties (and unordered listings) follow insertion order.
    pub fn list_all<R: Record>(&self, order: Option<Order>) -> Result<Vec<R>> {
        self.with_conn(|conn| list(conn, order))
    }

    pub fn clear(&self, collection: Collection) -> Result<usize> {
        self.with_conn_mut(|conn| clear(conn, collection))
    }

    pub fn count(&self, collection: Collection) -> Result<usize> {
        self.with_conn(|conn| count(conn, collection))
    }
}

// -- Statement helpers, usable inside `Database::atomically` --

pub fn insert<R: Record<Key = i64>>(conn: &Connection, record: &R) -> Result<i64> {
    conn.execute(&insert_sql::<R>(), record.params().as_slice())?;
    let id = conn.last_insert_rowid();
    debug!("{}: added {}", R::COLLECTION, id);
    Ok(id)
}

pub fn upsert<R: Record>(conn: &Connection, record: &R) -> Result<()> {
    let Some(key) = record.key() else {
        conn.execute(&insert_sql::<R>(), record.params().as_slice())?;
        debug!("{}: put without key, added {}", R::COLLECTION, conn.last_insert_rowid());
        return Ok(());
    };

    let collection = R::COLLECTION;
    let key_column = collection.key_column();
    let updates: Vec<String> = R::COLUMNS
        .iter()
        .map(|col| format!("{col} = excluded.{col}"))
        .collect();
    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {}",
        collection.table(),
        key_column,
        R::COLUMNS.join(", "),
        placeholders(R::COLUMNS.len() + 1),
        key_column,
        updates.join(", "),
    );

    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(R::COLUMNS.len() + 1);
    params.push(key as &dyn ToSql);
    params.extend(record.params());

    conn.execute(&sql, params.as_slice())?;
    debug!("{}: put", collection);
    Ok(())
}

pub fn get<R: Record>(conn: &Connection, key: &R::Key) -> Result<Option<R>> {
    let collection = R::COLLECTION;
    let sql = format!(
        "SELECT {}, {} FROM {} WHERE {} = ?1",
        collection.key_column(),
        R::COLUMNS.join(", "),
        collection.table(),
        collection.key_column(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([key as &dyn ToSql], R::from_row).optional()?;
    Ok(row)
}

pub fn delete(conn: &Connection, collection: Collection, key: &dyn ToSql) -> Result<bool> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        collection.table(),
        collection.key_column()
    );
    let removed = conn.execute(&sql, [key])? > 0;
    debug!("{}: delete removed={}", collection, removed);
    Ok(removed)
}

pub fn list<R: Record>(conn: &Connection, order: Option<Order>) -> Result<Vec<R>> {
    let collection = R::COLLECTION;
    let order_by = match (order, collection.index()) {
        (Some(order), Some(index)) => format!("{} {}, rowid ASC", index, order.sql()),
        _ => "rowid ASC".to_string(),
    };
    let sql = format!(
        "SELECT {}, {} FROM {} ORDER BY {}",
        collection.key_column(),
        R::COLUMNS.join(", "),
        collection.table(),
        order_by,
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], R::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn clear(conn: &Connection, collection: Collection) -> Result<usize> {
    let removed = conn.execute(&format!("DELETE FROM {}", collection.table()), [])?;
    debug!("{}: cleared {} records", collection, removed);
    Ok(removed)
}

pub fn count(conn: &Connection, collection: Collection) -> Result<usize> {
    let n: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", collection.table()),
        [],
        |row| row.get(0),
    )?;
    Ok(n as usize)
}

fn insert_sql<R: Record>() -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::COLLECTION.table(),
        R::COLUMNS.join(", "),
        placeholders(R::COLUMNS.len()),
    )
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
