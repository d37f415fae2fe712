// Simulated telemetry feed - periodic bounded random walk over the mock state
use crate::application::channels::{ChannelHub, PushMessage};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// `max(lower, min(upper, prev + U(-delta, +delta)))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomWalk {
    pub lower: f64,
    pub upper: f64,
    pub delta: f64,
}

impl RandomWalk {
    pub const fn new(lower: f64, upper: f64, delta: f64) -> Self {
        Self { lower, upper, delta }
    }

    pub fn step<R: Rng>(&self, prev: f64, rng: &mut R) -> f64 {
        let delta = self.delta.abs();
        let next = prev + rng.random_range(-delta..=delta);
        next.min(self.upper).max(self.lower)
    }
}

/// Something the feed advances once per tick.
#[async_trait]
pub trait FeedTarget: Send + Sync {
    /// Mutate the state one step and return the updates to push.
    async fn tick(&self, rng: &mut StdRng) -> Vec<PushMessage>;
}

/// Owner of a running feed task. Dropping it stops the feed.
pub struct FeedHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<u64>>,
}

impl FeedHandle {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the feed and wait for the task to exit. Returns the number of ticks run.
    pub async fn shutdown(mut self) -> u64 {
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => task.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "telemetry feed task failed");
                0
            }),
            None => 0,
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start driving `target` every `period`, publishing its updates on `hub`.
///
/// A single task runs the loop, so ticks never overlap; ticks missed while a
/// pass is still running are skipped rather than replayed.
pub fn spawn_feed(
    target: Arc<dyn FeedTarget>,
    hub: Arc<ChannelHub>,
    period: Duration,
    seed: Option<u64>,
) -> FeedHandle {
    let period = period.max(Duration::from_millis(1));
    let cancel = CancellationToken::new();
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let task = tokio::spawn(run(target, hub, period, rng, cancel.clone()));

    FeedHandle {
        cancel,
        task: Some(task),
    }
}

async fn run(
    target: Arc<dyn FeedTarget>,
    hub: Arc<ChannelHub>,
    period: Duration,
    mut rng: StdRng,
    cancel: CancellationToken,
) -> u64 {
    tracing::info!(interval_ms = period.as_millis() as u64, "telemetry feed started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick fires immediately; the first update comes one period in
    interval.tick().await;

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let updates = target.tick(&mut rng).await;
                for msg in updates {
                    if let Err(e) = hub.publish(msg) {
                        tracing::warn!(error = %e, "dropping feed update");
                    }
                }
                ticks += 1;
            }
        }
    }

    tracing::info!(ticks, "telemetry feed stopped");
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::channels::Topic;
    use crate::domain::alert::{EventKind, EventLogItem};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_random_walk_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let walk = RandomWalk::new(70.0, 95.0, 0.5);
        let mut value = 87.0;
        for _ in 0..10_000 {
            let next = walk.step(value, &mut rng);
            assert!((70.0..=95.0).contains(&next));
            assert!((next - value).abs() <= 0.5 + 1e-12);
            value = next;
        }
    }

    #[test]
    fn test_random_walk_clamps_out_of_range_start() {
        let mut rng = StdRng::seed_from_u64(1);
        let walk = RandomWalk::new(0.0, 160.0, 1.0);
        assert_eq!(walk.step(500.0, &mut rng), 160.0);
        assert_eq!(walk.step(-20.0, &mut rng), 0.0);
        assert_eq!(RandomWalk::new(0.0, 10.0, 0.0).step(4.0, &mut rng), 4.0);
    }

    struct CountingTarget {
        ticks: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        work: Duration,
    }

    impl CountingTarget {
        fn new(work: Duration) -> Self {
            Self {
                ticks: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                work,
            }
        }
    }

    #[async_trait]
    impl FeedTarget for CountingTarget {
        async fn tick(&self, _rng: &mut StdRng) -> Vec<PushMessage> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.work).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let n = self.ticks.fetch_add(1, Ordering::SeqCst);
            vec![PushMessage::Event(EventLogItem::new(
                &n.to_string(),
                "10:00",
                "tick",
                EventKind::Info,
            ))]
        }
    }

    #[tokio::test]
    async fn test_feed_publishes_and_stops() {
        let hub = Arc::new(ChannelHub::new(64));
        let mut events = hub.subscribe(Topic::Events);
        let target = Arc::new(CountingTarget::new(Duration::ZERO));

        let handle = spawn_feed(target.clone(), hub.clone(), Duration::from_millis(10), Some(1));
        let first = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("feed should publish")
            .unwrap();
        assert!(matches!(first, PushMessage::Event(_)));

        let ran = handle.shutdown().await;
        assert!(ran >= 1);

        let after = target.ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(target.ticks.load(Ordering::SeqCst), after);
    }

    #[tokio::test]
    async fn test_slow_ticks_never_overlap() {
        let hub = Arc::new(ChannelHub::new(64));
        let target = Arc::new(CountingTarget::new(Duration::from_millis(25)));

        let handle = spawn_feed(target.clone(), hub, Duration::from_millis(5), Some(2));
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.shutdown().await;

        assert!(target.ticks.load(Ordering::SeqCst) >= 1);
        assert_eq!(target.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropping_handle_cancels_feed() {
        let hub = Arc::new(ChannelHub::new(8));
        let target = Arc::new(CountingTarget::new(Duration::ZERO));

        let handle = spawn_feed(target, hub, Duration::from_millis(10), None);
        let token = handle.cancel_token();
        drop(handle);
        assert!(token.is_cancelled());
    }
}
