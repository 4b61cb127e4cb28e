use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortField {
    #[default]
    Title,
    Artist,
    AddedAt,
}

impl SortField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Artist => "artist",
            Self::AddedAt => "added",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "artist" => Some(Self::Artist),
            "added" | "addedat" | "added_at" => Some(Self::AddedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// How the `title` field is keyed when reordering the playlist.
///
/// `FirstLetter` buckets songs by the lowercase leading character only, so
/// "Apple" and "Avocado" compare equal and fall back to the tie-breaker.
/// `Full` compares the whole lowercase title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TitleSortPolicy {
    #[default]
    FirstLetter,
    Full,
}

/// Composite identity of a song. Unique within a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SongKey {
    pub title: String,
    pub artist: String,
}

impl SongKey {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }

    /// Filesystem-safe form used by the payload store.
    pub fn file_stem(&self) -> String {
        let raw = format!("{} - {}", self.title, self.artist);
        raw.chars()
            .map(|ch| match ch {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                other => other,
            })
            .collect()
    }
}

impl fmt::Display for SongKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Song {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub added_at_ms: i64,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

impl Song {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            added_at_ms: now_epoch_ms(),
            duration_seconds: None,
        }
    }

    pub fn key(&self) -> SongKey {
        SongKey::new(self.title.clone(), self.artist.clone())
    }

    pub fn matches_key(&self, key: &SongKey) -> bool {
        self.title == key.title && self.artist == key.artist
    }

    pub fn details(&self) -> String {
        match self.duration_seconds {
            Some(seconds) => format!(
                "{} by {}, Duration: {seconds} seconds",
                self.title, self.artist
            ),
            None => format!("{} by {}", self.title, self.artist),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub title_sort: TitleSortPolicy,
    #[serde(default)]
    pub sorted_view_field: SortField,
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    #[serde(default = "default_seed_demo_songs")]
    pub seed_demo_songs: bool,
}

fn default_history_len() -> usize {
    32
}

fn default_seed_demo_songs() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title_sort: TitleSortPolicy::default(),
            sorted_view_field: SortField::default(),
            history_len: default_history_len(),
            seed_demo_songs: default_seed_demo_songs(),
        }
    }
}

pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_include_duration_when_known() {
        let mut song = Song::new("Alpha", "X");
        assert_eq!(song.details(), "Alpha by X");
        song.duration_seconds = Some(212);
        assert_eq!(song.details(), "Alpha by X, Duration: 212 seconds");
    }

    #[test]
    fn file_stem_replaces_path_separators() {
        let key = SongKey::new("AC/DC: Live?", "Band");
        assert_eq!(key.file_stem(), "AC_DC_ Live_ - Band");
    }

    #[test]
    fn settings_fill_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"title_sort":"Full"}"#).expect("parse");
        assert_eq!(settings.title_sort, TitleSortPolicy::Full);
        assert_eq!(settings.history_len, 32);
        assert!(settings.seed_demo_songs);
    }

    #[test]
    fn song_without_timestamp_defaults_to_epoch() {
        let song: Song = serde_json::from_str(r#"{"title":"a","artist":"x"}"#).expect("parse");
        assert_eq!(song.added_at_ms, 0);
        assert_eq!(song.duration_seconds, None);
    }

    #[test]
    fn sort_field_parses_aliases() {
        assert_eq!(SortField::parse("Added"), Some(SortField::AddedAt));
        assert_eq!(SortField::parse(" artist "), Some(SortField::Artist));
        assert_eq!(SortField::parse("genre"), None);
    }
}
