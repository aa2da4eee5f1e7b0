//! Background eviction sweeper
//!
//! One long-lived task per cache-engine instance. It alternates between
//! sleeping on an interval timer and running one eviction pass; a failed
//! pass is logged and the task waits for the next tick, it never dies.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::SemanticCacheEngine;

/// Handle to a running eviction sweeper.
///
/// The task is cancellable through an explicit stop signal rather than being
/// a bare infinite loop, so process teardown can join it deterministically.
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also
/// stops the task at its next suspension point.
#[derive(Debug)]
pub struct EvictionSweeper {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

impl EvictionSweeper {
    /// Spawns the sweeper for an engine.
    ///
    /// The first pass runs one full interval after spawn; the spawn-time
    /// tick is consumed so an empty fresh namespace is not swept pointlessly.
    pub fn spawn(engine: Arc<SemanticCacheEngine>, interval: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match engine.enforce_max_entries().await {
                            Ok(evicted) => {
                                debug!(
                                    namespace = %engine.namespace().prefix(),
                                    evicted,
                                    "Eviction sweep finished"
                                );
                            }
                            Err(e) => {
                                warn!(
                                    namespace = %engine.namespace().prefix(),
                                    error = %e,
                                    "Eviction sweep failed, will retry next interval"
                                );
                            }
                        }
                    }
                    _ = stopped.changed() => {
                        debug!(
                            namespace = %engine.namespace().prefix(),
                            "Eviction sweeper stopping"
                        );
                        break;
                    }
                }
            }
        });

        Self { handle, stop }
    }

    /// Signals the task to stop and waits for it to finish
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.handle.await;
    }

    /// Whether the background task has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
