//! Optional change-notification feed.
//!
//! The feed only prompts clients to re-pull the wallet; the engine's
//! correctness never depends on delivery, so sends ignore lagging or closed
//! receivers.

use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOp {
    Insert,
    Update,
}

#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub subject_id: String,
    pub table: &'static str,
    pub op: ChangeOp,
}

#[derive(Clone, Debug)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, event: ChangeEvent) {
        // No receivers is fine; pull-based recomputation stays correct.
        let _ = self.sender.send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}
