//! [`StateStore`] – the UI-visible control state behind a watch channel.
//!
//! All components request updates through [`StateStore::set`]; the
//! server subscribes and pushes every new snapshot to connected
//! browsers. Handlers are dispatched one at a time by the host loop, so
//! there is never a concurrent read-modify-write against the state.

use tokio::sync::watch;
use turtleweb_types::{PanelState, StatePatch};

/// Shared control-state store. Clone it cheaply; all clones share the
/// same underlying channel.
#[derive(Clone, Debug)]
pub struct StateStore {
    tx: watch::Sender<PanelState>,
}

impl StateStore {
    pub fn new(initial: PanelState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Current state by value.
    pub fn snapshot(&self) -> PanelState {
        self.tx.borrow().clone()
    }

    /// Apply a partial update and notify all subscribers.
    pub fn set(&self, patch: StatePatch) {
        self.tx.send_modify(|state| patch.apply_to(state));
    }

    /// Watch for state changes. The receiver always starts with the
    /// current snapshot marked as seen-or-changed per watch semantics.
    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.tx.subscribe()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(PanelState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turtleweb_types::LaunchLabel;

    #[test]
    fn snapshot_reflects_initial_state() {
        let store = StateStore::default();
        let snap = store.snapshot();
        assert_eq!(snap.launch_button_label, LaunchLabel::Start);
        assert!(snap.disable);
    }

    #[tokio::test]
    async fn set_notifies_subscribers() {
        let store = StateStore::default();
        let mut rx = store.subscribe();
        rx.mark_unchanged();

        store.set(StatePatch {
            launch_button_label: Some(LaunchLabel::Stop),
            disable: Some(false),
            ..Default::default()
        });

        rx.changed().await.unwrap();
        let state = rx.borrow().clone();
        assert_eq!(state.launch_button_label, LaunchLabel::Stop);
        assert!(!state.disable);
    }

    #[test]
    fn empty_patch_leaves_state_intact() {
        let store = StateStore::default();
        let before = store.snapshot();
        store.set(StatePatch::default());
        assert_eq!(store.snapshot(), before);
    }
}
