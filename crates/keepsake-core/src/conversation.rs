use std::sync::Arc;

use anyhow::anyhow;
use keepsake_db::{queries, Collection, Connection, Database, MessageRow, Order, SettingRow};
use keepsake_types::{Message, Participant, SettingKey, Settings};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::{blocking, from_millis, now};

/// Messages between the two participants, plus the settings that name them.
#[derive(Clone)]
pub struct Conversation {
    db: Arc<Database>,
}

impl Conversation {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Post a message stamped with the current time.
    /// Blank text is ignored and yields `Ok(None)` without touching the store.
    pub async fn add_message(&self, from: Participant, text: &str) -> Result<Option<Message>> {
        if text.trim().is_empty() {
            debug!("Ignoring blank message from {}", from);
            return Ok(None);
        }

        let ts = now();
        let row = MessageRow::new(from.as_str(), text, ts.timestamp_millis());
        let id = blocking(&self.db, move |db| db.add(&row)).await?;

        info!("Message {} added from {}", id, from);
        Ok(Some(Message {
            id,
            from,
            text: text.to_string(),
            ts,
        }))
    }

    /// Replace a message's text, keeping its id, sender and timestamp.
    pub async fn edit_message(&self, id: i64, text: &str) -> Result<Message> {
        if text.trim().is_empty() {
            warn!("Rejected blank edit of message {}", id);
            return Err(Error::Validation("message text cannot be empty".into()));
        }

        let text = text.to_string();
        let updated = blocking(&self.db, move |db| {
            db.atomically(|tx| {
                let Some(mut row) = queries::get::<MessageRow>(tx, &id)? else {
                    return Ok(None);
                };
                row.text = text;
                queries::upsert(tx, &row)?;
                to_message(row).map(Some)
            })
        })
        .await?;

        match updated {
            Some(message) => {
                info!("Message {} edited", id);
                Ok(message)
            }
            None => Err(Error::NotFound {
                collection: Collection::Messages,
                id,
            }),
        }
    }

    /// Remove a message. Deleting a missing id is not an error; returns whether one was removed.
    pub async fn delete_message(&self, id: i64) -> Result<bool> {
        blocking(&self.db, move |db| db.delete::<MessageRow>(&id)).await
    }

    /// All messages, oldest first.
    pub async fn list_messages(&self) -> Result<Vec<Message>> {
        blocking(&self.db, |db| {
            db.list_all::<MessageRow>(Some(Order::Ascending))?
                .into_iter()
                .map(to_message)
                .collect()
        })
        .await
    }

    /// Name to show for a participant; "Me" / "Partner" until one is set.
    pub async fn resolve_display_name(&self, from: Participant) -> Result<String> {
        let key = from.name_key().as_str().to_string();
        let row = blocking(&self.db, move |db| db.get::<SettingRow>(&key)).await?;

        Ok(match row {
            Some(row) if !row.value.trim().is_empty() => row.value,
            _ => from.default_name().to_string(),
        })
    }

    pub async fn settings(&self) -> Result<Settings> {
        blocking(&self.db, |db| db.with_conn(load_settings)).await
    }

    pub async fn set_setting(&self, key: SettingKey, value: &str) -> Result<()> {
        let row = SettingRow::new(key.as_str(), value);
        blocking(&self.db, move |db| db.put(&row)).await?;
        info!("Setting {} updated", key);
        Ok(())
    }
}

pub(crate) fn to_message(row: MessageRow) -> anyhow::Result<Message> {
    Ok(Message {
        id: row.id.ok_or_else(|| anyhow!("message row without id"))?,
        from: row.sender.parse()?,
        text: row.text,
        ts: from_millis(row.ts),
    })
}

/// Read the settings collection. Rows with unknown keys are skipped.
pub(crate) fn load_settings(conn: &Connection) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    for row in queries::list::<SettingRow>(conn, None)? {
        match row.key.parse::<SettingKey>() {
            Ok(key) => settings.set(key, row.value),
            Err(e) => warn!("Skipping setting: {}", e),
        }
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Conversation {
        Conversation::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn add_then_list_contains_new_message() {
        let conv = conversation();
        let first = conv.add_message(Participant::A, "good morning").await.unwrap().unwrap();
        let second = conv.add_message(Participant::B, "  hi you  ").await.unwrap().unwrap();

        let listed = conv.list_messages().await.unwrap();
        assert_eq!(listed, vec![first.clone(), second.clone()]);
        assert_eq!(second.from, Participant::B);
        assert_eq!(second.text, "  hi you  ");
        assert!(second.ts >= first.ts);
    }

    #[tokio::test]
    async fn blank_message_is_a_no_op() {
        let conv = conversation();
        assert!(conv.add_message(Participant::A, "").await.unwrap().is_none());
        assert!(conv.add_message(Participant::A, " \n\t ").await.unwrap().is_none());
        assert!(conv.list_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_keeps_identity() {
        let conv = conversation();
        let original = conv.add_message(Participant::B, "typo").await.unwrap().unwrap();

        let edited = conv.edit_message(original.id, "fixed").await.unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.from, original.from);
        assert_eq!(edited.ts, original.ts);
        assert_eq!(edited.text, "fixed");

        assert_eq!(conv.list_messages().await.unwrap(), vec![edited]);
    }

    #[tokio::test]
    async fn blank_edit_is_rejected_and_leaves_message() {
        let conv = conversation();
        let original = conv.add_message(Participant::A, "keep me").await.unwrap().unwrap();

        for blank in ["", "   "] {
            let err = conv.edit_message(original.id, blank).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }

        assert_eq!(conv.list_messages().await.unwrap(), vec![original]);
    }

    #[tokio::test]
    async fn edit_missing_message_is_not_found() {
        let conv = conversation();
        let err = conv.edit_message(77, "hello").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 77, .. }));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let conv = conversation();
        let msg = conv.add_message(Participant::A, "bye").await.unwrap().unwrap();

        assert!(conv.delete_message(msg.id).await.unwrap());
        assert!(!conv.delete_message(msg.id).await.unwrap());
        assert!(conv.list_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn display_names_fall_back_to_defaults() {
        let conv = conversation();
        assert_eq!(conv.resolve_display_name(Participant::A).await.unwrap(), "Me");
        assert_eq!(conv.resolve_display_name(Participant::B).await.unwrap(), "Partner");

        conv.set_setting(SettingKey::NameB, "Ana").await.unwrap();
        conv.set_setting(SettingKey::NameA, "").await.unwrap();
        assert_eq!(conv.resolve_display_name(Participant::A).await.unwrap(), "Me");
        assert_eq!(conv.resolve_display_name(Participant::B).await.unwrap(), "Ana");
    }

    #[tokio::test]
    async fn settings_are_upserted() {
        let conv = conversation();
        conv.set_setting(SettingKey::Theme, "rose").await.unwrap();
        conv.set_setting(SettingKey::Theme, "night").await.unwrap();

        let settings = conv.settings().await.unwrap();
        assert_eq!(settings.theme.as_deref(), Some("night"));
        assert_eq!(settings.name_a, None);
    }
}
