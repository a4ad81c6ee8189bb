//! Helpers for the static side of the page: asset manifests and letter titles.

use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
const LETTER_EXTENSIONS: &[&str] = &["txt", "md"];

/// `2024-02-14-our-first-trip.md` → date + rest
static DATED_LETTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9]{4})-([0-9]{2})-([0-9]{2})[-_\s]?(.*)\.(txt|md)$").unwrap()
});

static LETTER_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(txt|md)$").unwrap());

/// `manifest.json` listing the files in an asset folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub files: Vec<String>,
}

impl Manifest {
    /// Read a manifest. A missing file means nothing has been published yet
    /// and yields an empty manifest.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No manifest at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Image entries, sorted. An entry needs a real `.ext` suffix, so
    /// `beachpng` is not an image.
    pub fn images(&self) -> Vec<&str> {
        self.with_extension(IMAGE_EXTENSIONS)
    }

    /// Letter entries (`.txt` / `.md`), sorted.
    pub fn letters(&self) -> Vec<&str> {
        self.with_extension(LETTER_EXTENSIONS)
    }

    /// The image shown at the top of the page.
    pub fn hero(&self) -> Option<&str> {
        self.images().into_iter().next()
    }

    fn with_extension(&self, extensions: &[&str]) -> Vec<&str> {
        let mut files: Vec<&str> = self
            .files
            .iter()
            .map(String::as_str)
            .filter(|name| {
                name.rsplit_once('.').is_some_and(|(_, ext)| {
                    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
                })
            })
            .collect();
        files.sort_unstable();
        files
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterTitle {
    pub title: String,
    /// Long-form date, e.g. "February 14, 2024", when the file name starts with one.
    pub date: Option<String>,
}

/// Turn a letter's file name into a display title and optional date.
pub fn prettify_filename(name: &str) -> LetterTitle {
    if let Some(caps) = DATED_LETTER.captures(name) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().unwrap_or_default(),
            caps[2].parse().unwrap_or_default(),
            caps[3].parse().unwrap_or_default(),
        )
        .map(|d| d.format("%B %-d, %Y").to_string());

        return LetterTitle {
            title: tidy(&caps[4]),
            date,
        };
    }

    LetterTitle {
        title: tidy(&LETTER_EXTENSION.replace(name, "")),
        date: None,
    }
}

fn tidy(raw: &str) -> String {
    let title = raw.replace(['-', '_'], " ");
    let title = title.trim();
    if title.is_empty() {
        "Letter".to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(files: &[&str]) -> Manifest {
        Manifest {
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn filters_and_sorts_by_kind() {
        let m = manifest(&["b.PNG", "notes.md", "a.jpeg", "readme", "x.gif", "2024-01-01.txt", "clip.mov"]);
        assert_eq!(m.images(), vec!["a.jpeg", "b.PNG", "x.gif"]);
        assert_eq!(m.letters(), vec!["2024-01-01.txt", "notes.md"]);
        assert_eq!(m.hero(), Some("a.jpeg"));
        assert_eq!(Manifest::default().hero(), None);
    }

    #[test]
    fn extension_needs_a_dot() {
        let m = manifest(&["beachpng", "notesmd", "beach.png", ".md"]);
        assert_eq!(m.images(), vec!["beach.png"]);
        assert_eq!(m.letters(), vec![".md"]);
    }

    #[test]
    fn manifest_tolerates_missing_files_key() {
        let m: Manifest = serde_json::from_str("{}").unwrap();
        assert!(m.files.is_empty());
    }

    #[tokio::test]
    async fn missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let m = Manifest::load(&dir.path().join("manifest.json")).await.unwrap();
        assert_eq!(m, Manifest::default());
    }

    #[tokio::test]
    async fn malformed_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Manifest::load(&path).await, Err(crate::Error::Json(_))));

        std::fs::write(&path, r#"{"files": ["a.png"]}"#).unwrap();
        assert_eq!(Manifest::load(&path).await.unwrap().images(), vec!["a.png"]);
    }

    #[test]
    fn dated_letter() {
        assert_eq!(
            prettify_filename("2024-02-14-our_first-trip.md"),
            LetterTitle {
                title: "our first trip".into(),
                date: Some("February 14, 2024".into()),
            }
        );
        assert_eq!(
            prettify_filename("2023-07-04 fireworks.TXT").date.as_deref(),
            Some("July 4, 2023")
        );
    }

    #[test]
    fn dated_letter_without_title() {
        let t = prettify_filename("2024-02-14.txt");
        assert_eq!(t.title, "Letter");
        assert_eq!(t.date.as_deref(), Some("February 14, 2024"));
    }

    #[test]
    fn impossible_date_is_dropped() {
        let t = prettify_filename("2024-13-40-oops.md");
        assert_eq!(t.title, "oops");
        assert_eq!(t.date, None);
    }

    #[test]
    fn undated_letter() {
        assert_eq!(
            prettify_filename("why_i-love_you.txt"),
            LetterTitle {
                title: "why i love you".into(),
                date: None,
            }
        );
        assert_eq!(prettify_filename("__.md").title, "Letter");
    }

    #[test]
    fn non_ascii_digits_are_not_a_date() {
        assert_eq!(
            prettify_filename("٢٠٢٤-٠٢-١٤-note.md"),
            LetterTitle {
                title: "٢٠٢٤ ٠٢ ١٤ note".into(),
                date: None,
            }
        );
    }
}
