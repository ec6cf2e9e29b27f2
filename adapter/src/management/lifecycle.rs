use crate::error::{AdapterError, AdapterResult};
use gsm_protocol::management::server::LifecycleState;
use log::{debug, warn};
use tokio::sync::broadcast;

const STATE_CHANNEL_CAPACITY: usize = 16;

/// Tracks the lifecycle state of one server and publishes every change.
pub struct Lifecycle {
    state: LifecycleState,
    state_tx: broadcast::Sender<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        Lifecycle {
            state: LifecycleState::NotStarted,
            state_tx,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    pub fn transition(&mut self, next: LifecycleState) -> AdapterResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(AdapterError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.set(next);
        Ok(())
    }

    /// Like [`Lifecycle::transition`] but tolerates skipped steps, which
    /// happens when the host stops a process this instance did not see start.
    /// `Failed` is never left.
    pub fn force(&mut self, next: LifecycleState) {
        if self.state.is_terminal() {
            warn!("lifecycle is {}, ignoring move to {}", self.state, next);
            return;
        }
        if !self.state.can_transition_to(next) {
            warn!("unexpected lifecycle move {} -> {}", self.state, next);
        }
        self.set(next);
    }

    /// Returns to `previous` after an operation gave up half way.
    pub fn revert(&mut self, previous: LifecycleState) {
        if self.state != previous {
            self.set(previous);
        }
    }

    fn set(&mut self, next: LifecycleState) {
        debug!("lifecycle {} -> {}", self.state, next);
        self.state = next;
        // no subscribers is fine
        let _ = self.state_tx.send(next);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
