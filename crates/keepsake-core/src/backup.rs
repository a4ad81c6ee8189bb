use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, Utc};
use keepsake_db::{queries, Database, MessageRow, PhotoRow, SettingRow};
use keepsake_types::{
    BackupDocument, BackupMessage, BackupPhoto, BackupSettings, BACKUP_VERSION,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::conversation::{load_settings, to_message};
use crate::error::{Error, Result};
use crate::photos::to_photo;
use crate::{blocking, now};

/// Records merged by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub photos: usize,
    pub messages: usize,
    pub settings: usize,
}

/// Exports every collection to one JSON document and merges such documents back in.
#[derive(Clone)]
pub struct Backup {
    db: Arc<Database>,
}

impl Backup {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Snapshot of all three collections, read under one lock.
    pub async fn export(&self) -> Result<BackupDocument> {
        let doc = blocking(&self.db, |db| {
            db.with_conn(|conn| {
                let photos = queries::list::<PhotoRow>(conn, None)?
                    .into_iter()
                    .map(|row| {
                        let photo = to_photo(row)?;
                        Ok(BackupPhoto {
                            id: Some(photo.id),
                            data_url: to_data_url(&photo.mime_type, &photo.data),
                            name: photo.name,
                            added_at: Some(photo.added_at.timestamp_millis()),
                        })
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;

                let messages = queries::list::<MessageRow>(conn, None)?
                    .into_iter()
                    .map(|row| {
                        let message = to_message(row)?;
                        Ok(BackupMessage {
                            id: Some(message.id),
                            from: message.from,
                            text: message.text,
                            ts: Some(message.ts.timestamp_millis()),
                        })
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;

                let settings = BackupSettings::from(load_settings(conn)?);

                Ok(BackupDocument {
                    v: BACKUP_VERSION,
                    exported_at: now().timestamp_millis(),
                    photos,
                    messages,
                    settings,
                })
            })
        })
        .await?;

        info!(
            "Exported backup: {} photos, {} messages",
            doc.photos.len(),
            doc.messages.len()
        );
        Ok(doc)
    }

    pub async fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export().await?)?)
    }

    pub async fn export_to_writer<W: Write>(&self, writer: W) -> Result<BackupDocument> {
        let doc = self.export().await?;
        serde_json::to_writer(writer, &doc)?;
        Ok(doc)
    }

    /// Write the backup into `dir` under its suggested file name and return the path.
    pub async fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let doc = self.export().await?;
        let path = dir.join(doc.file_name());
        tokio::fs::write(&path, serde_json::to_vec(&doc)?).await?;
        info!("Backup written to {}", path.display());
        Ok(path)
    }

    /// Parse and merge a backup. The version tag is checked before anything else.
    pub async fn import_json(&self, raw: &str) -> Result<ImportSummary> {
        let mut value: Value = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidBackup(format!("not JSON: {}", e)))?;
        let v = version_tag(value.get("v"));
        check_version(v)?;
        value["v"] = Value::from(BACKUP_VERSION);

        let doc: BackupDocument = serde_json::from_value(value)
            .map_err(|e| Error::InvalidBackup(e.to_string()))?;
        self.import(&doc).await
    }

    /// Merge a backup into the store.
    ///
    /// Photos and messages are always added as new records, keeping their
    /// timestamps when the document has them. Settings in the document
    /// overwrite current values; settings it lacks are left alone. The
    /// document is fully validated first and written in one transaction.
    pub async fn import(&self, doc: &BackupDocument) -> Result<ImportSummary> {
        check_version(Some(doc.v))?;

        let fallback_ts = now().timestamp_millis();

        let photos = doc
            .photos
            .iter()
            .enumerate()
            .map(|(i, photo)| {
                let (mime_type, data) = parse_data_url(&photo.data_url)
                    .map_err(|e| Error::InvalidBackup(format!("photo #{} '{}': {}", i, photo.name, e)))?;
                Ok(PhotoRow::new(
                    &photo.name,
                    &mime_type,
                    data,
                    checked_millis(photo.added_at, fallback_ts)
                        .map_err(|e| Error::InvalidBackup(format!("photo #{} '{}': {}", i, photo.name, e)))?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let messages = doc
            .messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                if message.text.trim().is_empty() {
                    return Err(Error::InvalidBackup(format!("message #{} has empty text", i)));
                }
                Ok(MessageRow::new(
                    message.from.as_str(),
                    &message.text,
                    checked_millis(message.ts, fallback_ts)
                        .map_err(|e| Error::InvalidBackup(format!("message #{}: {}", i, e)))?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let settings: Vec<SettingRow> = doc
            .settings
            .present()
            .into_iter()
            .map(|(key, value)| SettingRow::new(key.as_str(), value))
            .collect();

        let summary = ImportSummary {
            photos: photos.len(),
            messages: messages.len(),
            settings: settings.len(),
        };

        blocking(&self.db, move |db| {
            db.atomically(|tx| {
                for row in &photos {
                    queries::insert(tx, row)?;
                }
                for row in &messages {
                    queries::insert(tx, row)?;
                }
                for row in &settings {
                    queries::upsert(tx, row)?;
                }
                Ok(())
            })
        })
        .await?;

        info!(
            "Imported backup: {} photos, {} messages, {} settings",
            summary.photos, summary.messages, summary.settings
        );
        Ok(summary)
    }
}

fn check_version(v: Option<u64>) -> Result<()> {
    if v == Some(BACKUP_VERSION) {
        return Ok(());
    }
    warn!("Refusing backup with version {:?}", v);
    Err(Error::UnsupportedFormat(v))
}

/// JSON has one number type, so `1.0` is read as version 1. Fractional or
/// negative values are no version at all.
fn version_tag(v: Option<&Value>) -> Option<u64> {
    let v = v?;
    v.as_u64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

/// A document timestamp, or `fallback` when absent. Values outside the range
/// a `DateTime` can hold are refused so they cannot be read back as the epoch.
fn checked_millis(ms: Option<i64>, fallback: i64) -> std::result::Result<i64, String> {
    match ms {
        None => Ok(fallback),
        Some(ms) if DateTime::<Utc>::from_timestamp_millis(ms).is_some() => Ok(ms),
        Some(ms) => Err(format!("timestamp {} is out of range", ms)),
    }
}

/// `data:<mime>;base64,<payload>`
pub fn to_data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, B64.encode(data))
}

/// Split a base64 data URI into its MIME type and decoded bytes.
pub fn parse_data_url(url: &str) -> std::result::Result<(String, Vec<u8>), String> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URI".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URI has no payload".to_string())?;
    let media = header
        .strip_suffix(";base64")
        .ok_or_else(|| "data URI is not base64".to_string())?;

    let mime_type = match media.split(';').next().map(str::trim) {
        Some(mime) if !mime.is_empty() => mime.to_string(),
        _ => "application/octet-stream".to_string(),
    };
    let data = B64
        .decode(payload.trim())
        .map_err(|e| format!("bad base64: {}", e))?;

    Ok((mime_type, data))
}
