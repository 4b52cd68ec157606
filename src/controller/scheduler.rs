use std::future::Future;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};

/// Fixed-interval round trigger.
///
/// Ticks are computed from absolute deadlines (`previous tick + interval`),
/// never from the end of a round, so slow rounds do not make the schedule
/// drift. Rounds are spawned and may overlap when one outlasts the interval.
pub struct Scheduler {
    interval: Duration,
    initial_offset: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration, initial_offset: Duration) -> Self {
        Self {
            interval,
            initial_offset,
        }
    }

    /// Triggers `round_fn` every interval until `shutdown` turns `true`.
    ///
    /// Waits `initial_offset` once before the first tick. On shutdown no
    /// further round starts, rounds already running are awaited, and the
    /// number of dispatched rounds is returned.
    ///
    /// If the loop itself wakes up more than a whole interval late (host
    /// suspended, runtime starved) the missed ticks are not replayed; the
    /// schedule restarts from the current instant.
    pub async fn run<F, Fut>(&self, mut round_fn: F, mut shutdown: watch::Receiver<bool>) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rounds = JoinSet::new();
        let mut dispatched: u64 = 0;
        let mut deadline = Instant::now() + self.initial_offset;

        info!(
            "Scheduler started: interval={:?}, initial_offset={:?}",
            self.interval, self.initial_offset
        );

        loop {
            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    info!("Shutdown requested, no further rounds will start");
                    break;
                }
                _ = sleep_until(deadline) => {}
            }

            let tick = deadline;
            dispatched += 1;
            debug!("Tick #{} dispatched", dispatched);
            rounds.spawn(round_fn());

            while let Some(joined) = rounds.try_join_next() {
                if let Err(e) = joined {
                    error!("Round task failed: {}", e);
                }
            }

            deadline = tick + self.interval;
            let now = Instant::now();
            if now >= deadline + self.interval {
                warn!(
                    "Scheduler is {:?} behind, skipping missed ticks",
                    now.duration_since(deadline)
                );
                deadline = now;
            }
        }

        if !rounds.is_empty() {
            info!("Waiting for {} in-flight rounds", rounds.len());
        }
        while let Some(joined) = rounds.join_next().await {
            if let Err(e) = joined {
                error!("Round task failed: {}", e);
            }
        }
        info!("Scheduler stopped after {} rounds", dispatched);
        dispatched
    }
}

/// Resolves once shutdown is requested. A dropped sender never resolves.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let sender_gone = shutdown.wait_for(|stop| *stop).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}
