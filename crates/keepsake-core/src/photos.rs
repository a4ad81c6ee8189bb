use std::sync::Arc;

use anyhow::anyhow;
use keepsake_db::{Collection, Database, Order, PhotoRow};
use keepsake_types::Photo;
use tracing::info;

use crate::error::Result;
use crate::imaging::{self, ImageConfig};
use crate::{blocking, from_millis, now};

#[derive(Clone)]
pub struct Photos {
    db: Arc<Database>,
    image: ImageConfig,
}

impl Photos {
    pub fn new(db: Arc<Database>, image: ImageConfig) -> Self {
        Self { db, image }
    }

    /// Store an uploaded image, downscaling it first if it exceeds the
    /// configured maximum dimension.
    pub async fn add_photo(&self, bytes: Vec<u8>, name: &str) -> Result<Photo> {
        let config = self.image;
        // decoding and resizing are CPU bound
        let prepared = tokio::task::spawn_blocking(move || imaging::prepare(bytes, &config))
            .await
            .map_err(|e| crate::Error::StoreUnavailable(e.into()))??;

        let added_at = now();
        let row = PhotoRow::new(name, &prepared.mime_type, prepared.data, added_at.timestamp_millis());
        let (id, row) = blocking(&self.db, move |db| Ok((db.add(&row)?, row))).await?;

        info!(
            "Photo {} added: '{}' {}x{}{}",
            id,
            name,
            prepared.width,
            prepared.height,
            if prepared.resized { " (downscaled)" } else { "" }
        );
        Ok(Photo {
            id,
            name: row.name,
            mime_type: row.mime_type,
            data: row.data,
            added_at,
        })
    }

    pub async fn get_photo(&self, id: i64) -> Result<Option<Photo>> {
        blocking(&self.db, move |db| db.get::<PhotoRow>(&id)?.map(to_photo).transpose()).await
    }

    /// Remove a photo. Deleting a missing id is not an error; returns whether one was removed.
    pub async fn delete_photo(&self, id: i64) -> Result<bool> {
        blocking(&self.db, move |db| db.delete::<PhotoRow>(&id)).await
    }

    /// All photos, newest first.
    pub async fn list_photos(&self) -> Result<Vec<Photo>> {
        blocking(&self.db, |db| {
            db.list_all::<PhotoRow>(Some(Order::Descending))?
                .into_iter()
                .map(to_photo)
                .collect()
        })
        .await
    }

    pub async fn clear_all_photos(&self) -> Result<usize> {
        let removed = blocking(&self.db, |db| db.clear(Collection::Photos)).await?;
        info!("Cleared {} photos", removed);
        Ok(removed)
    }
}

pub(crate) fn to_photo(row: PhotoRow) -> anyhow::Result<Photo> {
    Ok(Photo {
        id: row.id.ok_or_else(|| anyhow!("photo row without id"))?,
        name: row.name,
        mime_type: row.mime_type,
        data: row.data,
        added_at: from_millis(row.added_at),
    })
}
