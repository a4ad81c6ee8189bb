use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Participant, SettingKey, Settings};

/// The only backup format version this build reads and writes.
pub const BACKUP_VERSION: u64 = 1;

/// Portable backup of every collection.
///
/// Timestamps are epoch milliseconds. Photo payloads travel as base64 data
/// URIs so the whole document stays plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub v: u64,
    /// Informational only; import does not read it.
    #[serde(default)]
    pub exported_at: i64,
    #[serde(default)]
    pub photos: Vec<BackupPhoto>,
    #[serde(default)]
    pub messages: Vec<BackupMessage>,
    #[serde(default)]
    pub settings: BackupSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPhoto {
    /// Key in the exporting store. Ignored on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<i64>,
    #[serde(rename = "dataURL")]
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMessage {
    /// Key in the exporting store. Ignored on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub from: Participant,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

/// Settings section. Absent keys are left untouched on import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSettings {
    #[serde(rename = "nameA", default, skip_serializing_if = "Option::is_none")]
    pub name_a: Option<String>,
    #[serde(rename = "nameB", default, skip_serializing_if = "Option::is_none")]
    pub name_b: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl BackupSettings {
    /// Key/value pairs present in the document.
    pub fn present(&self) -> Vec<(SettingKey, &str)> {
        [
            (SettingKey::NameA, self.name_a.as_deref()),
            (SettingKey::NameB, self.name_b.as_deref()),
            (SettingKey::Theme, self.theme.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

impl From<Settings> for BackupSettings {
    fn from(settings: Settings) -> Self {
        Self {
            name_a: settings.name_a,
            name_b: settings.name_b,
            theme: settings.theme,
        }
    }
}

impl BackupDocument {
    /// Suggested download name, e.g. `keepsake-backup-2024-02-14.json`.
    pub fn file_name(&self) -> String {
        let date = DateTime::<Utc>::from_timestamp_millis(self.exported_at).unwrap_or_default();
        format!("keepsake-backup-{}.json", date.format("%Y-%m-%d"))
    }
}
