pub mod backup;
pub mod models;

pub use backup::{BackupDocument, BackupMessage, BackupPhoto, BackupSettings, BACKUP_VERSION};
pub use models::{Message, Participant, Photo, SettingKey, Settings};
