use std::marker::PhantomData;

use super::{AdError, AdNetwork, LoadCallback, ShowCallback, ShowEvent};

/// Ad network that never has inventory - for builds with ads disabled or tests
pub struct NoOpAdNetwork<A = ()> {
    _ad: PhantomData<fn() -> A>,
}

impl<A> NoOpAdNetwork<A> {
    pub fn new() -> Self {
        Self { _ad: PhantomData }
    }
}

impl<A> Default for NoOpAdNetwork<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Send + 'static> AdNetwork for NoOpAdNetwork<A> {
    type Ad = A;

    fn load(&self, _unit_id: &str, on_loaded: LoadCallback<A>) {
        on_loaded(Err(AdError::new("no ad network configured")));
    }

    fn show(&self, _ad: A, on_event: ShowCallback) {
        on_event(ShowEvent::FailedToShow(AdError::new(
            "no ad network configured",
        )));
    }
}
