//! Timer-driven polling of one game.
//!
//! The cadence lives here; what a poll does is [`GameClient::refresh`], which
//! can be exercised without a timer.

use crate::ledger::Ledger;
use crate::session::{GameClient, GameSession, RefreshOutcome};
use crate::storage::SessionStore;
use crate::types::GameId;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Running refresh task. Dropping it stops the polling.
pub struct RefreshHandle {
    task: JoinHandle<()>,
    updates: watch::Receiver<Option<GameSession>>,
}

impl RefreshHandle {
    /// Latest session seen by the task, starting with the local record.
    pub fn updates(&self) -> watch::Receiver<Option<GameSession>> {
        self.updates.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Poll `game` every `refresh_interval` until it reaches a terminal phase.
///
/// Unreachable-ledger errors are logged and retried on the next tick; any
/// other error ends the task.
pub fn spawn_refresh<L, S>(client: Arc<GameClient<L, S>>, game: GameId) -> RefreshHandle
where
    L: Ledger + 'static,
    S: SessionStore + 'static,
{
    let every = client.config().refresh_interval;
    let initial = match client.session(&game) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Could not load local record of game {}: {}", game, e);
            None
        }
    };
    let (tx, updates) = watch::channel(initial);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match client.refresh(&game).await {
                Ok(RefreshOutcome::Updated(session)) => {
                    let finished = session.is_terminal();
                    if tx.send(Some(session)).is_err() || finished {
                        break;
                    }
                }
                Ok(RefreshOutcome::Skipped) => {}
                Err(e) if e.is_transient() => {
                    tracing::warn!("Refresh of game {} failed, retrying: {}", game, e);
                }
                Err(e) => {
                    tracing::warn!("Stopped refreshing game {}: {}", game, e);
                    break;
                }
            }
        }

        tracing::debug!("Refresh task for game {} finished", game);
    });

    RefreshHandle {
        task,
        updates,
    }
}
