use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::shift::shift_timestamps;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Caption container, told apart by a content sniff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    WebVtt,
    SubRip,
}

impl CaptionFormat {
    /// WebVTT if the text carries a `WEBVTT` header (any case), else SubRip.
    pub fn sniff(text: &str) -> Self {
        if text.to_ascii_uppercase().contains("WEBVTT") {
            CaptionFormat::WebVtt
        } else {
            CaptionFormat::SubRip
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            CaptionFormat::WebVtt => "text/vtt",
            CaptionFormat::SubRip => "application/x-subrip",
        }
    }
}

/// Caption text with the per-title delay applied, ready to hand to a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub format: CaptionFormat,
    pub text: String,
    pub offset_ms: i64,
    pub language: String,
}

impl SubtitleTrack {
    pub fn prepare(raw: &str, offset_ms: i64) -> Self {
        Self {
            format: CaptionFormat::sniff(raw),
            text: shift_timestamps(raw, offset_ms),
            offset_ms,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// In-memory `data:` URI carrying the shifted text as unwrapped base64.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(self.text.as_bytes())
        )
    }
}
