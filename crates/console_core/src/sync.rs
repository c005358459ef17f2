//! Pulls the authoritative world state into the session's read model.

use std::sync::Arc;

use shared::protocol::WorldState;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    selection::reconcile,
    session::{Session, SessionEvent},
};

impl Session {
    /// One poll cycle. Failures are logged and leave the previous snapshot in
    /// place; returns whether a new snapshot was applied.
    pub async fn refresh(self: &Arc<Self>) -> bool {
        match self.api.get_state().await {
            Ok(world) => {
                debug!(
                    submarines = world.submarines.len(),
                    has_ship = world.ship.is_some(),
                    "state refreshed"
                );
                self.replace_world(Some(world)).await;
                true
            }
            Err(err) => {
                warn!("state poll failed: {err}");
                self.log(format!("Failed to load state: {err}")).await;
                false
            }
        }
    }

    /// The only mutator of the world snapshot. Re-runs selection
    /// reconciliation against the new roster.
    pub(crate) async fn replace_world(self: &Arc<Self>, world: Option<WorldState>) {
        let selection_change = {
            let mut guard = self.inner.lock().await;
            let roster = world
                .as_ref()
                .map(|world| world.submarines.as_slice())
                .unwrap_or_default();
            let next = reconcile(roster, guard.selection.as_ref());
            guard.world = world.clone();
            if next != guard.selection {
                guard.selection = next.clone();
                Some(next)
            } else {
                None
            }
        };

        self.emit(SessionEvent::WorldUpdated(world));
        if let Some(selection) = selection_change {
            debug!(selection = ?selection, "selection reconciled");
            self.emit(SessionEvent::SelectionChanged(selection));
            self.restart_live_view_refresh().await;
        }
    }

    /// Polls immediately, then on every tick of the configured cadence. Each
    /// poll runs as its own task so a hung request never holds back the next
    /// tick.
    pub fn spawn_poller(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        let period = self.options.poll_interval;
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    session.refresh().await;
                });
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
