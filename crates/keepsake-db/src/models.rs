//! Database row types: these map directly to SQLite rows.
//! Distinct from keepsake-types models to keep the DB layer independent.
//! Timestamps are epoch milliseconds.

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRow {
    /// `None` until the store assigns a key.
    pub id: Option<i64>,
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub added_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    /// `None` until the store assigns a key.
    pub id: Option<i64>,
    pub sender: String,
    pub text: String,
    pub ts: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingRow {
    pub key: String,
    pub value: String,
}

impl PhotoRow {
    pub fn new(name: &str, mime_type: &str, data: Vec<u8>, added_at: i64) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            data,
            added_at,
        }
    }
}

impl MessageRow {
    pub fn new(sender: &str, text: &str, ts: i64) -> Self {
        Self {
            id: None,
            sender: sender.to_string(),
            text: text.to_string(),
            ts,
        }
    }
}

impl SettingRow {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}
