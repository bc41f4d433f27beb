//! Periodic expiry sweep, independent of request traffic.

use super::{now_millis, store::OtpStore};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

/// Production sweep period.
pub const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Handle to the background sweep task. The server holds it for the
/// process lifetime; tests call [`Sweeper::stop`] for a clean shutdown.
#[derive(Debug)]
pub struct Sweeper {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub fn spawn(store: Arc<OtpStore>, period: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut tick = interval(period);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let removed = store.sweep_expired(now_millis());

                        if removed > 0 {
                            debug!("swept {removed} expired passcode records");
                        }
                    }

                    _ = &mut stopped => {
                        info!("sweeper stopping");
                        break;
                    }
                }
            }
        });

        Self {
            stop: Some(stop),
            handle,
        }
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        let _ = self.handle.await;
    }
}
