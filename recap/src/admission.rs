//! Interstitial ad admission control.
//!
//! Keeps one ad pre-fetched and decides, each time the user wants to start
//! playback, whether that ad may be shown. Presentations are limited with a
//! sliding window over past presentation times. Whatever happens (no ad,
//! rate limited, ad shown, ad failed) the caller's continuation runs exactly
//! once, so playback is never held hostage by ad serving.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::ad_network::{AdNetwork, ShowEvent};
use crate::clock::{Clock, MonotonicClock};
use crate::dispatch::{Dispatcher, InlineDispatcher, Task};

/// Interstitial unit used when the config does not name one.
pub const DEFAULT_AD_UNIT_ID: &str = "ca-app-pub-2958975586761098/7877855823";

/// Length of the rate-limit window (60 seconds).
pub const WINDOW_MS: u64 = 60_000;

/// Presentations allowed inside one window.
pub const MAX_ADS_PER_WINDOW: usize = 2;

/// Rate limit and ad unit for one controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionPolicy {
    pub unit_id: String,
    pub window_ms: u64,
    pub max_per_window: usize,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            unit_id: DEFAULT_AD_UNIT_ID.to_string(),
            window_ms: WINDOW_MS,
            max_per_window: MAX_ADS_PER_WINDOW,
        }
    }
}

/// Observable state of the ad slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Loading,
    Loaded,
    Presenting,
}

/// Which branch a [`AdmissionController::present`] call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// No ad was loaded; a load was requested and the continuation ran.
    NotLoaded,
    /// An ad is loaded but the window is full; the ad stays for later.
    RateLimited,
    /// The ad was handed to the network; the continuation runs when it closes.
    Presenting,
}

enum AdSlot<A> {
    Empty,
    Loading { generation: u64 },
    Loaded(A),
    Presenting { generation: u64 },
}

impl<A> AdSlot<A> {
    fn state(&self) -> SlotState {
        match self {
            AdSlot::Empty => SlotState::Empty,
            AdSlot::Loading { .. } => SlotState::Loading,
            AdSlot::Loaded(_) => SlotState::Loaded,
            AdSlot::Presenting { .. } => SlotState::Presenting,
        }
    }
}

/// Presentation timestamps in chronological order.
struct PresentationLog {
    window_ms: u64,
    max_per_window: usize,
    shown_at: VecDeque<u64>,
}

impl PresentationLog {
    fn new(window_ms: u64, max_per_window: usize) -> Self {
        Self {
            window_ms,
            max_per_window,
            shown_at: VecDeque::new(),
        }
    }

    // An entry exactly `window_ms` old still counts.
    fn expired(&self, shown_at: u64, now: u64) -> bool {
        shown_at < now.saturating_sub(self.window_ms)
    }

    fn in_window(&self, now: u64) -> usize {
        self.shown_at
            .iter()
            .filter(|&&t| !self.expired(t, now))
            .count()
    }

    fn prune(&mut self, now: u64) -> usize {
        let before = self.shown_at.len();
        let cutoff = now.saturating_sub(self.window_ms);
        self.shown_at.retain(|&t| t >= cutoff);
        before - self.shown_at.len()
    }

    fn has_room(&self, now: u64) -> bool {
        self.in_window(now) < self.max_per_window
    }

    fn record(&mut self, now: u64) {
        self.shown_at.push_back(now);
    }

    fn clear(&mut self) {
        self.shown_at.clear();
    }
}

struct State<A> {
    slot: AdSlot<A>,
    log: PresentationLog,
    generation: u64,
}

impl<A> State<A> {
    /// Purges expired entries, then reports whether another presentation fits.
    fn admit(&mut self, now: u64) -> bool {
        let pruned = self.log.prune(now);
        if pruned > 0 {
            debug!("cleared {pruned} expired ad timestamps");
        }
        let room = self.log.has_room(now);
        if !room {
            info!(
                "ad rate limit hit: {}/{} ads shown in the last {}ms",
                self.log.shown_at.len(),
                self.log.max_per_window,
                self.log.window_ms
            );
        }
        room
    }
}

struct Shared<N: AdNetwork> {
    network: N,
    clock: Arc<dyn Clock>,
    dispatcher: Arc<dyn Dispatcher>,
    policy: AdmissionPolicy,
    state: Mutex<State<N::Ad>>,
}

impl<N: AdNetwork> Shared<N> {
    fn lock(&self) -> MutexGuard<'_, State<N::Ad>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

enum Decision<A> {
    NotLoaded,
    RateLimited,
    Present { ad: A, generation: u64 },
}

/// Handle to one ad slot and its presentation log.
///
/// Clones share the same slot. Every state transition happens under one lock;
/// the lock is never held while calling into the ad network or running a
/// caller continuation, so SDKs that call back synchronously are fine.
pub struct AdmissionController<N: AdNetwork> {
    shared: Arc<Shared<N>>,
}

impl<N: AdNetwork> Clone for AdmissionController<N> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<N: AdNetwork> AdmissionController<N> {
    /// Controller on a monotonic clock that runs continuations inline.
    pub fn new(network: N, policy: AdmissionPolicy) -> Self {
        Self::from_parts(
            network,
            policy,
            Arc::new(MonotonicClock::new()),
            Arc::new(InlineDispatcher),
        )
    }

    pub fn from_parts(
        network: N,
        policy: AdmissionPolicy,
        clock: Arc<dyn Clock>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let log = PresentationLog::new(policy.window_ms, policy.max_per_window);
        Self {
            shared: Arc::new(Shared {
                network,
                clock,
                dispatcher,
                policy,
                state: Mutex::new(State {
                    slot: AdSlot::Empty,
                    log,
                    generation: 0,
                }),
            }),
        }
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.shared.policy
    }

    pub fn network(&self) -> &N {
        &self.shared.network
    }

    /// Starts loading an ad unless one is loading, loaded or on screen.
    pub fn request_load(&self) {
        let generation = {
            let mut state = self.shared.lock();
            match state.slot {
                AdSlot::Empty => {}
                AdSlot::Loading { .. } => {
                    debug!("ad is already loading, skipping request");
                    return;
                }
                AdSlot::Loaded(_) => {
                    debug!("ad already loaded, skipping request");
                    return;
                }
                AdSlot::Presenting { .. } => {
                    debug!("ad is on screen, refill happens when it closes");
                    return;
                }
            }
            state.generation += 1;
            let generation = state.generation;
            state.slot = AdSlot::Loading { generation };
            generation
        };

        debug!(
            "starting ad load for {} (generation {generation})",
            self.shared.policy.unit_id
        );
        let weak = Arc::downgrade(&self.shared);
        self.shared.network.load(
            &self.shared.policy.unit_id,
            Box::new(move |result| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let mut state = shared.lock();
                match state.slot {
                    AdSlot::Loading { generation: current } if current == generation => {}
                    _ => {
                        debug!("discarding stale ad load (generation {generation})");
                        return;
                    }
                }
                match result {
                    Ok(ad) => {
                        debug!("ad loaded (generation {generation})");
                        state.slot = AdSlot::Loaded(ad);
                    }
                    Err(err) => {
                        warn!("ad failed to load: {err}");
                        state.slot = AdSlot::Empty;
                    }
                }
            }),
        );
    }

    /// True if an ad is loaded and presenting it now would pass the rate
    /// limit. Does not touch the presentation log.
    pub fn is_ready(&self) -> bool {
        let now = self.shared.clock.now_ms();
        let state = self.shared.lock();
        matches!(state.slot, AdSlot::Loaded(_)) && state.log.has_room(now)
    }

    /// Purges expired presentations and reports whether another one fits.
    pub fn can_present(&self) -> bool {
        let now = self.shared.clock.now_ms();
        self.shared.lock().admit(now)
    }

    /// Shows the loaded ad if the rate limit allows, then runs `on_complete`.
    ///
    /// `on_complete` runs exactly once on every path, through the configured
    /// dispatcher. When an ad is presented it runs after the first show event
    /// (shown, dismissed or failed), once the slot has been emptied and a
    /// replacement load requested.
    pub fn present<F>(&self, on_complete: F) -> PresentOutcome
    where
        F: FnOnce() + Send + 'static,
    {
        let on_complete: Task = Box::new(on_complete);
        let now = self.shared.clock.now_ms();

        let decision = {
            let mut state = self.shared.lock();
            if !matches!(state.slot, AdSlot::Loaded(_)) {
                Decision::NotLoaded
            } else if !state.admit(now) {
                Decision::RateLimited
            } else {
                let generation = state.generation;
                match std::mem::replace(&mut state.slot, AdSlot::Presenting { generation }) {
                    AdSlot::Loaded(ad) => {
                        // The attempt is what gets rate limited, not the outcome.
                        state.log.record(now);
                        Decision::Present { ad, generation }
                    }
                    other => {
                        state.slot = other;
                        Decision::NotLoaded
                    }
                }
            }
        };

        match decision {
            Decision::NotLoaded => {
                debug!("present: ad is not ready, triggering load");
                self.request_load();
                self.shared.dispatcher.dispatch(on_complete);
                PresentOutcome::NotLoaded
            }
            Decision::RateLimited => {
                debug!("present: rate limit active, skipping ad");
                self.shared.dispatcher.dispatch(on_complete);
                PresentOutcome::RateLimited
            }
            Decision::Present { ad, generation } => {
                debug!("present: showing ad");
                self.show(ad, generation, on_complete);
                PresentOutcome::Presenting
            }
        }
    }

    fn show(&self, ad: N::Ad, generation: u64, on_complete: Task) {
        let pending = Mutex::new(Some(on_complete));
        let weak = Arc::downgrade(&self.shared);
        let dispatcher = Arc::clone(&self.shared.dispatcher);

        self.shared.network.show(
            ad,
            Box::new(move |event| {
                let Some(task) = pending.lock().unwrap_or_else(|e| e.into_inner()).take() else {
                    debug!("ignoring {event:?}, presentation already finished");
                    return;
                };
                match &event {
                    ShowEvent::FailedToShow(err) => warn!("ad failed to show: {err}"),
                    other => debug!("ad presentation ended with {other:?}"),
                }
                if let Some(shared) = weak.upgrade() {
                    AdmissionController { shared }.finish_presentation(generation);
                }
                dispatcher.dispatch(task);
            }),
        );
    }

    fn finish_presentation(&self, generation: u64) {
        {
            let mut state = self.shared.lock();
            match state.slot {
                AdSlot::Presenting { generation: current } if current == generation => {
                    state.slot = AdSlot::Empty;
                }
                _ => {
                    debug!("controller was reset while presenting, leaving slot alone");
                    return;
                }
            }
        }
        self.request_load();
    }

    /// Clears the presentation log and drops any ad. Loads and presentations
    /// still in flight are ignored when they report back.
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        state.log.clear();
        state.generation += 1;
        state.slot = AdSlot::Empty;
        info!("ads control reset");
    }

    pub fn slot_state(&self) -> SlotState {
        self.shared.lock().slot.state()
    }

    /// Presentations inside the current window, without pruning.
    pub fn presentations_in_window(&self) -> usize {
        let now = self.shared.clock.now_ms();
        self.shared.lock().log.in_window(now)
    }
}
