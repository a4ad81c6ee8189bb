use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::imaging::ImageConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub image: ImageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("keepsake.db"),
            image: ImageConfig::default(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment, loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, against an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("KEEPSAKE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let max_dimension = parse_var(&lookup, "KEEPSAKE_MAX_IMAGE_DIMENSION")?
            .unwrap_or(defaults.image.max_dimension);
        let jpeg_quality: u8 = parse_var(&lookup, "KEEPSAKE_JPEG_QUALITY")?
            .unwrap_or(defaults.image.jpeg_quality);

        if max_dimension == 0 {
            return Err(Error::Config("KEEPSAKE_MAX_IMAGE_DIMENSION must be > 0".into()));
        }

        Ok(Self {
            db_path,
            image: ImageConfig {
                max_dimension,
                jpeg_quality: jpeg_quality.clamp(1, 100),
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} is not a valid number: '{}'", key, raw))),
    }
}
