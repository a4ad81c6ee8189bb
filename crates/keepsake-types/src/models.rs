use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two people the page belongs to.
/// Messages carry this tag instead of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Participant {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
}

impl Participant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    /// Name shown when the participant has not set one.
    pub fn default_name(self) -> &'static str {
        match self {
            Self::A => "Me",
            Self::B => "Partner",
        }
    }

    /// The settings entry holding this participant's display name.
    pub fn name_key(self) -> SettingKey {
        match self {
            Self::A => SettingKey::NameA,
            Self::B => SettingKey::NameB,
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Participant {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

/// The fixed set of setting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingKey {
    #[serde(rename = "nameA")]
    NameA,
    #[serde(rename = "nameB")]
    NameB,
    #[serde(rename = "theme")]
    Theme,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [Self::NameA, Self::NameB, Self::Theme];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NameA => "nameA",
            Self::NameB => "nameB",
            Self::Theme => "theme",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// Returned when a stored tag is neither a known participant nor a known setting key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTag(pub String);

impl fmt::Display for UnknownTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tag '{}'", self.0)
    }
}

impl std::error::Error for UnknownTag {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub from: Participant,
    pub text: String,
    pub ts: DateTime<Utc>,
}

/// Current setting values. `None` means never set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub name_a: Option<String>,
    pub name_b: Option<String>,
    pub theme: Option<String>,
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> Option<&str> {
        match key {
            SettingKey::NameA => self.name_a.as_deref(),
            SettingKey::NameB => self.name_b.as_deref(),
            SettingKey::Theme => self.theme.as_deref(),
        }
    }

    pub fn set(&mut self, key: SettingKey, value: String) {
        match key {
            SettingKey::NameA => self.name_a = Some(value),
            SettingKey::NameB => self.name_b = Some(value),
            SettingKey::Theme => self.theme = Some(value),
        }
    }

    /// Display name for a participant, falling back to "Me" / "Partner".
    /// An empty stored name counts as unset.
    pub fn display_name(&self, who: Participant) -> &str {
        self.get(who.name_key())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(who.default_name())
    }

    /// Entries that have a value, in key order.
    pub fn entries(&self) -> impl Iterator<Item = (SettingKey, &str)> {
        SettingKey::ALL
            .into_iter()
            .filter_map(move |key| self.get(key).map(|value| (key, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_tags_roundtrip_through_str() {
        assert_eq!("A".parse::<Participant>().unwrap(), Participant::A);
        assert_eq!("B".parse::<Participant>().unwrap(), Participant::B);
        assert!("C".parse::<Participant>().is_err());
        assert_eq!(Participant::B.to_string(), "B");
    }

    #[test]
    fn setting_keys_parse() {
        assert_eq!("nameA".parse::<SettingKey>().unwrap(), SettingKey::NameA);
        assert_eq!("theme".parse::<SettingKey>().unwrap(), SettingKey::Theme);
        assert_eq!(
            "colour".parse::<SettingKey>().unwrap_err(),
            UnknownTag("colour".into())
        );
    }

    #[test]
    fn display_name_defaults() {
        let mut settings = Settings::default();
        assert_eq!(settings.display_name(Participant::A), "Me");
        assert_eq!(settings.display_name(Participant::B), "Partner");

        settings.set(SettingKey::NameB, "Ana".into());
        settings.set(SettingKey::NameA, "   ".into());
        assert_eq!(settings.display_name(Participant::A), "Me");
        assert_eq!(settings.display_name(Participant::B), "Ana");
    }

    #[test]
    fn entries_skip_unset() {
        let settings = Settings {
            name_a: None,
            name_b: Some("Sam".into()),
            theme: Some("rose".into()),
        };
        let entries: Vec<_> = settings.entries().collect();
        assert_eq!(entries, vec![(SettingKey::NameB, "Sam"), (SettingKey::Theme, "rose")]);
    }
}
