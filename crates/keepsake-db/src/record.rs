use std::fmt;

use rusqlite::types::ToSql;
use rusqlite::Row;

use crate::models::{MessageRow, PhotoRow, SettingRow};

/// Named collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Photos,
    Messages,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Self::Photos, Self::Messages, Self::Settings];

    pub fn table(self) -> &'static str {
        match self {
            Self::Photos => "photos",
            Self::Messages => "messages",
            Self::Settings => "settings",
        }
    }

    pub fn key_column(self) -> &'static str {
        match self {
            Self::Photos | Self::Messages => "id",
            Self::Settings => "key",
        }
    }

    /// Secondary field `list_all` can order by.
    pub fn index(self) -> Option<&'static str> {
        match self {
            Self::Photos => Some("added_at"),
            Self::Messages => Some("ts"),
            Self::Settings => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A row type stored in one collection.
///
/// `from_row` receives the key column first, then `COLUMNS` in order;
/// `params` binds `COLUMNS` in the same order.
pub trait Record: Sized {
    type Key: ToSql;

    const COLLECTION: Collection;
    /// Non-key columns.
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> Option<&Self::Key>;
    fn params(&self) -> Vec<&dyn ToSql>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl Record for PhotoRow {
    type Key = i64;

    const COLLECTION: Collection = Collection::Photos;
    const COLUMNS: &'static [&'static str] = &["name", "mime_type", "data", "added_at"];

    fn key(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![&self.name, &self.mime_type, &self.data, &self.added_at]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PhotoRow {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            mime_type: row.get(2)?,
            data: row.get(3)?,
            added_at: row.get(4)?,
        })
    }
}

impl Record for MessageRow {
    type Key = i64;

    const COLLECTION: Collection = Collection::Messages;
    const COLUMNS: &'static [&'static str] = &["sender", "text", "ts"];

    fn key(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![&self.sender, &self.text, &self.ts]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(MessageRow {
            id: Some(row.get(0)?),
            sender: row.get(1)?,
            text: row.get(2)?,
            ts: row.get(3)?,
        })
    }
}

impl Record for SettingRow {
    type Key = String;

    const COLLECTION: Collection = Collection::Settings;
    const COLUMNS: &'static [&'static str] = &["value"];

    fn key(&self) -> Option<&String> {
        Some(&self.key)
    }

    fn params(&self) -> Vec<&dyn ToSql> {
        vec![&self.value]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SettingRow {
            key: row.get(0)?,
            value: row.get(1)?,
        })
    }
}
