//! Caption text handling: timestamp shifting and player-ready tracks.

mod shift;
mod track;

pub use shift::{Marker, Timestamp, shift_timestamps, timestamps};
pub use track::{CaptionFormat, DEFAULT_LANGUAGE, SubtitleTrack};
