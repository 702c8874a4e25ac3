//! Recap player core: interstitial ad admission and subtitle timing.
//!
//! The UI layer owns screens, networking and persistence. It calls into
//! [`AdmissionController`] before starting playback and runs fetched caption
//! text through [`shift_timestamps`] (or [`SubtitleTrack::prepare`]) before
//! building the playable media item.

pub mod ad_network;
pub mod admission;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod subtitles;

pub use ad_network::{AdError, AdNetwork, LoadCallback, NoOpAdNetwork, ShowCallback, ShowEvent};
pub use admission::{
    AdmissionController, AdmissionPolicy, DEFAULT_AD_UNIT_ID, MAX_ADS_PER_WINDOW, PresentOutcome,
    SlotState, WINDOW_MS,
};
pub use catalog::{Movie, MovieResponse, parse_catalog};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{AD_UNIT_ENV, AdSettings, ConfigError, RecapConfig};
pub use dispatch::{Dispatcher, InlineDispatcher, QueueDispatcher, Task};
pub use subtitles::{CaptionFormat, Marker, SubtitleTrack, Timestamp, shift_timestamps, timestamps};
