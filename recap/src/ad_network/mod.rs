//! Pluggable interstitial ad capability.
//!
//! The admission controller only needs two asynchronous primitives from an
//! ad SDK: load an ad for a unit, and show a loaded ad. Both report back
//! through callbacks that may fire on any thread, possibly before the call
//! that triggered them has returned.

use std::fmt;

mod noop;

pub use noop::NoOpAdNetwork;

/// Completion for [`AdNetwork::load`]. Invoked exactly once.
pub type LoadCallback<A> = Box<dyn FnOnce(Result<A, AdError>) + Send>;

/// Event sink for [`AdNetwork::show`]. SDKs commonly report several events
/// per presentation (shown, then dismissed), so this may be called repeatedly.
pub type ShowCallback = Box<dyn Fn(ShowEvent) + Send + Sync>;

/// Failure reported by the ad network for a load or show attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdError {
    pub message: String,
}

impl AdError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for AdError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for AdError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for AdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ad network error: {}", self.message)
    }
}

impl std::error::Error for AdError {}

/// Lifecycle events emitted while a full-screen ad is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowEvent {
    Shown,
    Dismissed,
    FailedToShow(AdError),
}

/// External interstitial ad SDK.
pub trait AdNetwork: Send + Sync + 'static {
    /// Opaque handle to a loaded, not yet presented ad.
    type Ad: Send + 'static;

    /// Start loading an ad for `unit_id`. Must not block.
    fn load(&self, unit_id: &str, on_loaded: LoadCallback<Self::Ad>);

    /// Present a previously loaded ad. Must not block.
    fn show(&self, ad: Self::Ad, on_event: ShowCallback);
}

/// `None` means ads are switched off: every load fails and nothing is shown.
impl<N: AdNetwork> AdNetwork for Option<N> {
    type Ad = N::Ad;

    fn load(&self, unit_id: &str, on_loaded: LoadCallback<Self::Ad>) {
        match self {
            Some(network) => network.load(unit_id, on_loaded),
            None => NoOpAdNetwork::<N::Ad>::new().load(unit_id, on_loaded),
        }
    }

    fn show(&self, ad: Self::Ad, on_event: ShowCallback) {
        match self {
            Some(network) => network.show(ad, on_event),
            None => NoOpAdNetwork::<N::Ad>::new().show(ad, on_event),
        }
    }
}
