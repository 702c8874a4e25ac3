//! Catalog models shared with the movie feed.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::subtitles::SubtitleTrack;

/// A title in the recap feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    #[serde(rename = "videoURL")]
    pub video_url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, rename = "featuredThumbnail")]
    pub featured_thumbnail: Option<String>,
    pub title: String,
    /// Feeds send this as a number or a numeric string; anything else is 0.
    #[serde(deserialize_with = "lenient_year")]
    pub year: i32,
    pub duration: String,
    pub categories: Vec<String>,
    pub description: String,
    #[serde(default, rename = "subtitleURL")]
    pub subtitle_url: Option<String>,
    /// Milliseconds; positive delays captions, negative advances them.
    #[serde(default, rename = "subtitleDelay")]
    pub subtitle_delay: i64,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<i64>,
}

impl Movie {
    pub fn has_subtitles(&self) -> bool {
        self.subtitle_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Applies this title's stored delay to freshly fetched caption text.
    pub fn subtitle_track(&self, raw: &str) -> SubtitleTrack {
        SubtitleTrack::prepare(raw, self.subtitle_delay)
    }
}

/// Feed envelope: movies keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieResponse {
    pub movies: HashMap<String, Movie>,
}

impl MovieResponse {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Parses a feed document into its movies.
///
/// Accepts the `{"movies": {...}}` envelope or a bare id-to-movie map. A
/// literal `null` (an empty node in the backing store) is an empty catalog.
/// A document with a `movies` key is always read as an envelope.
pub fn parse_catalog(json: &str) -> Result<Vec<Movie>, serde_json::Error> {
    let movies: HashMap<String, Movie> = match serde_json::from_str(json)? {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Object(map) if map.contains_key("movies") => {
            serde_json::from_value::<MovieResponse>(serde_json::Value::Object(map))?.movies
        }
        other => serde_json::from_value(other)?,
    };
    Ok(movies.into_values().collect())
}

fn lenient_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()).unwrap_or(0),
        serde_json::Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    })
}
