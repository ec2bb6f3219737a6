//! Data bridge: connects the active screen's state holder to TUI actions.
//!
//! One bridge runs per active screen. It builds a fresh holder, forwards
//! every snapshot as an [`Action`], and routes user intents back to the
//! holder. Cancelling the bridge drops the holder, which releases its
//! platform listeners.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use netsense_core::{StateStream, Telemetry};

use crate::action::{Action, Intent};
use crate::screen::ScreenId;

/// Handle to a running bridge. Dropping it stops the bridge.
pub struct BridgeHandle {
    screen: ScreenId,
    intents: mpsc::UnboundedSender<Intent>,
    cancel: CancellationToken,
}

impl BridgeHandle {
    pub fn screen(&self) -> ScreenId {
        self.screen
    }

    /// Forward an intent to the holder. Returns false if the bridge is gone.
    pub fn send(&self, intent: Intent) -> bool {
        self.intents.send(intent).is_ok()
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start a bridge for `screen`, or `None` if it has no live data.
pub fn spawn_data_bridge(
    telemetry: &Telemetry,
    screen: ScreenId,
    action_tx: mpsc::UnboundedSender<Action>,
) -> Option<BridgeHandle> {
    if !screen.has_feed() {
        return None;
    }

    let (intent_tx, intent_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let telemetry = telemetry.clone();
    let task_cancel = cancel.clone();

    tokio::spawn(async move {
        match screen {
            ScreenId::Dashboard => {
                let holder = telemetry.dashboard();
                let sub = holder.subscribe();
                forward(sub, Action::DashboardUpdated, intent_rx, &action_tx, &task_cancel, |i| {
                    if i == Intent::StartSpeedTest {
                        holder.start_speed_test();
                    }
                })
                .await;
            }
            ScreenId::Network => {
                let holder = telemetry.network_screen();
                let sub = holder.subscribe();
                forward(sub, Action::NetworkUpdated, intent_rx, &action_tx, &task_cancel, |i| {
                    match i {
                        Intent::StartSpeedTest => holder.start_speed_test(),
                        Intent::RefreshNetwork => holder.refresh(),
                    }
                })
                .await;
            }
            ScreenId::Sensors => {
                let holder = telemetry.sensors_screen();
                let sub = holder.subscribe();
                forward(sub, Action::SensorsUpdated, intent_rx, &action_tx, &task_cancel, |_| {})
                    .await;
            }
            ScreenId::Settings => {}
        }
        debug!(%screen, "data bridge shut down");
    });

    Some(BridgeHandle {
        screen,
        intents: intent_tx,
        cancel,
    })
}

/// Push the current snapshot, then every change, until cancelled.
async fn forward<S: Send + Sync + 'static>(
    mut sub: StateStream<S>,
    wrap: fn(Arc<S>) -> Action,
    mut intents: mpsc::UnboundedReceiver<Intent>,
    action_tx: &mpsc::UnboundedSender<Action>,
    cancel: &CancellationToken,
    on_intent: impl Fn(Intent),
) {
    let _ = action_tx.send(wrap(Arc::clone(sub.current())));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(intent) = intents.recv() => {
                debug!(?intent, "dispatching intent");
                on_intent(intent);
            }

            changed = sub.changed() => match changed {
                Some(snapshot) => {
                    if action_tx.send(wrap(snapshot)).is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
}
