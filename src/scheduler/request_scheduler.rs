//! Priority scheduler that keeps outbound requests under the upstream's
//! rate limits
//!
//! One dispatch task per scheduler instance: callers may have any number of
//! requests outstanding in the queue, but dispatch itself is serialized so
//! the rate accounting stays exact. Rate-limited dispatches are re-queued at
//! the front and the whole scheduler cools down; every other failure belongs
//! to the caller.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};
use crate::config::settings::{
    DEFAULT_BURST_LIMIT, DEFAULT_BURST_WINDOW_SECS, DEFAULT_REQUESTS_PER_MINUTE,
    DEFAULT_REQUESTS_PER_SECOND, RATE_LIMIT_COOLDOWN_SECS,
};
use crate::errors::{BotError, BotResult};

#[derive(Debug, Clone)]
pub struct RateLimits {
    pub requests_per_second: u32,
    pub requests_per_minute: u32,
    pub burst_limit: u32,
    pub burst_window: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_limit: DEFAULT_BURST_LIMIT,
            burst_window: Duration::from_secs(DEFAULT_BURST_WINDOW_SECS),
            rate_limit_cooldown: Duration::from_secs(RATE_LIMIT_COOLDOWN_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    Background,
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    pub total_submitted: u64,
    pub total_dispatched: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub rate_limit_hits: u64,
}

#[derive(Debug, Clone)]
pub struct SchedulerUtilization {
    pub dispatched_last_second: usize,
    pub dispatched_last_minute: usize,
    pub second_utilization: f64,
    pub minute_utilization: f64,
    pub queue_depth: usize,
}

enum TaskDisposition {
    Completed,
    Failed,
    RateLimited,
}

type TaskRunner = Box<dyn FnMut() -> BoxFuture<'static, TaskDisposition> + Send>;

struct QueuedTask {
    priority: TaskPriority,
    seq: u64,
    run: TaskRunner,
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Max-heap: higher priority first, then FIFO within a priority.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct SchedulerShared {
    limits: RateLimits,
    history: Mutex<VecDeque<Instant>>,
    stats: RwLock<SchedulerStats>,
    queue_depth: AtomicUsize,
    seq: AtomicU64,
}

impl SchedulerShared {
    /// Minimum wait before the next dispatch satisfies every configured
    /// window at once. Also prunes history older than the widest window.
    async fn required_wait(&self) -> Duration {
        let now = Instant::now();
        let mut history = self.history.lock().await;
        while history
            .front()
            .is_some_and(|t| now.duration_since(*t) >= Duration::from_secs(60))
        {
            history.pop_front();
        }

        let per_second = window_wait(
            &history,
            now,
            Duration::from_secs(1),
            self.limits.requests_per_second,
        );
        let burst = window_wait(
            &history,
            now,
            self.limits.burst_window,
            self.limits.burst_limit,
        );
        let per_minute = window_wait(
            &history,
            now,
            Duration::from_secs(60),
            self.limits.requests_per_minute,
        );

        per_second.max(burst).max(per_minute)
    }

    async fn record_dispatch(&self) {
        self.history.lock().await.push_back(Instant::now());
        self.stats.write().await.total_dispatched += 1;
    }
}

/// How long until a dispatch would no longer exceed `limit` events per
/// `window`. Zero when the window has headroom now.
fn window_wait(history: &VecDeque<Instant>, now: Instant, window: Duration, limit: u32) -> Duration {
    let limit = limit.max(1) as usize;
    let in_window = history
        .iter()
        .rev()
        .take_while(|t| now.duration_since(**t) < window)
        .count();
    if in_window < limit {
        return Duration::ZERO;
    }
    // Dispatch becomes legal once the limit-th most recent entry ages out.
    let pivot = history[history.len() - limit];
    (pivot + window).saturating_duration_since(now)
}

pub struct RequestScheduler {
    shared: Arc<SchedulerShared>,
    submit_tx: mpsc::UnboundedSender<QueuedTask>,
}

impl RequestScheduler {
    pub fn new(limits: RateLimits) -> Self {
        let shared = Arc::new(SchedulerShared {
            limits,
            history: Mutex::new(VecDeque::new()),
            stats: RwLock::new(SchedulerStats::default()),
            queue_depth: AtomicUsize::new(0),
            seq: AtomicU64::new(0),
        });

        let (submit_tx, submit_rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch_loop(Arc::clone(&shared), submit_rx));

        Self { shared, submit_tx }
    }

    /// Runs `task` once the rate budget allows it. `task` is a factory so a
    /// rate-limited dispatch can be re-run after the cool-down; the scheduler
    /// retries nothing else.
    pub async fn execute<T, F, Fut>(&self, priority: TaskPriority, task: F) -> BotResult<T>
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = BotResult<T>> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel::<BotResult<T>>();
        let task = Arc::new(task);
        let reply = Arc::new(std::sync::Mutex::new(Some(reply_tx)));

        let run: TaskRunner = Box::new(move || {
            let task = Arc::clone(&task);
            let reply = Arc::clone(&reply);
            async move {
                let outcome = task().await;
                let disposition = match &outcome {
                    // Keep the reply channel: this dispatch will be re-run.
                    Err(e) if e.is_rate_limited() => return TaskDisposition::RateLimited,
                    Err(_) => TaskDisposition::Failed,
                    Ok(_) => TaskDisposition::Completed,
                };
                if let Ok(mut slot) = reply.lock() {
                    if let Some(tx) = slot.take() {
                        let _ = tx.send(outcome);
                    }
                }
                disposition
            }
            .boxed()
        });

        let seq = self.shared.seq.fetch_add(1, Ordering::Relaxed);
        self.shared.queue_depth.fetch_add(1, Ordering::Relaxed);
        self.shared.stats.write().await.total_submitted += 1;

        self.submit_tx
            .send(QueuedTask { priority, seq, run })
            .map_err(|_| BotError::SchedulerClosed("dispatch task stopped".to_string()))?;

        reply_rx
            .await
            .map_err(|_| BotError::SchedulerClosed("dispatch task dropped the request".to_string()))?
    }

    pub async fn stats(&self) -> SchedulerStats {
        self.shared.stats.read().await.clone()
    }

    pub async fn utilization(&self) -> SchedulerUtilization {
        let now = Instant::now();
        let history = self.shared.history.lock().await;
        let last_second = history
            .iter()
            .rev()
            .take_while(|t| now.duration_since(**t) < Duration::from_secs(1))
            .count();
        let last_minute = history
            .iter()
            .rev()
            .take_while(|t| now.duration_since(**t) < Duration::from_secs(60))
            .count();

        SchedulerUtilization {
            dispatched_last_second: last_second,
            dispatched_last_minute: last_minute,
            second_utilization: last_second as f64
                / self.shared.limits.requests_per_second.max(1) as f64,
            minute_utilization: last_minute as f64
                / self.shared.limits.requests_per_minute.max(1) as f64,
            queue_depth: self.shared.queue_depth.load(Ordering::Relaxed),
        }
    }

    /// Inter-scan delay callers should apply to their own polling loop. Grows
    /// linearly with minute-window utilization and saturates when a backlog
    /// builds up, so scan frequency adapts to observed load.
    pub async fn recommended_scan_delay(&self, min: Duration, max: Duration) -> Duration {
        let util = self.utilization().await;
        if util.queue_depth > self.shared.limits.burst_limit as usize {
            return max;
        }
        let factor = util.minute_utilization.clamp(0.0, 1.0);
        let span = max.saturating_sub(min);
        min + span.mul_f64(factor)
    }
}

async fn dispatch_loop(shared: Arc<SchedulerShared>, mut rx: mpsc::UnboundedReceiver<QueuedTask>) {
    let mut heap: BinaryHeap<QueuedTask> = BinaryHeap::new();
    let mut retry_slot: Option<QueuedTask> = None;

    loop {
        while let Ok(task) = rx.try_recv() {
            heap.push(task);
        }

        let mut task = match retry_slot.take().or_else(|| heap.pop()) {
            Some(task) => task,
            None => match rx.recv().await {
                Some(task) => task,
                // All scheduler handles dropped and the queue is drained.
                None => break,
            },
        };

        let wait = shared.required_wait().await;
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Rate budget exhausted, waiting");
            tokio::time::sleep(wait).await;

            // Anything that arrived during the wait competes for this slot.
            while let Ok(arrived) = rx.try_recv() {
                heap.push(arrived);
            }
            if heap.peek().is_some_and(|best| best > &task) {
                heap.push(task);
                task = heap.pop().expect("heap contains the task just pushed");
            }
        }

        shared.record_dispatch().await;
        shared.queue_depth.fetch_sub(1, Ordering::Relaxed);

        match (task.run)().await {
            TaskDisposition::Completed => {
                shared.stats.write().await.total_completed += 1;
            }
            TaskDisposition::Failed => {
                shared.stats.write().await.total_failed += 1;
            }
            TaskDisposition::RateLimited => {
                {
                    let mut stats = shared.stats.write().await;
                    stats.rate_limit_hits += 1;
                }
                shared.queue_depth.fetch_add(1, Ordering::Relaxed);
                warn!(
                    cooldown_secs = shared.limits.rate_limit_cooldown.as_secs(),
                    "Upstream rate limit hit, cooling down"
                );
                tokio::time::sleep(shared.limits.rate_limit_cooldown).await;
                retry_slot = Some(task);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn test_limits(rps: u32) -> RateLimits {
        RateLimits {
            requests_per_second: rps,
            requests_per_minute: 10_000,
            burst_limit: 10_000,
            burst_window: Duration::from_secs(10),
            rate_limit_cooldown: Duration::from_secs(3),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_per_second_window() {
        let scheduler = Arc::new(RequestScheduler::new(test_limits(2)));
        let timestamps: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let scheduler = Arc::clone(&scheduler);
            let timestamps = Arc::clone(&timestamps);
            handles.push(tokio::spawn(async move {
                scheduler
                    .execute(TaskPriority::Normal, move || {
                        let timestamps = Arc::clone(&timestamps);
                        async move {
                            timestamps.lock().await.push(Instant::now());
                            Ok::<_, BotError>(())
                        }
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut stamps = timestamps.lock().await.clone();
        stamps.sort();
        assert_eq!(stamps.len(), 5);
        // No more than 2 completions inside any sliding 1-second window.
        for pair in stamps.windows(3) {
            assert!(
                pair[2].duration_since(pair[0]) >= Duration::from_secs(1),
                "3 dispatches within one second: {:?}",
                pair.iter().map(|t| t.duration_since(stamps[0])).collect::<Vec<_>>()
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn respects_minute_window() {
        let limits = RateLimits {
            requests_per_second: 100,
            requests_per_minute: 3,
            burst_limit: 10_000,
            burst_window: Duration::from_secs(10),
            rate_limit_cooldown: Duration::from_secs(3),
        };
        let scheduler = Arc::new(RequestScheduler::new(limits));
        let timestamps: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let scheduler = Arc::clone(&scheduler);
            let timestamps = Arc::clone(&timestamps);
            handles.push(tokio::spawn(async move {
                scheduler
                    .execute(TaskPriority::Normal, move || {
                        let timestamps = Arc::clone(&timestamps);
                        async move {
                            timestamps.lock().await.push(Instant::now());
                            Ok::<_, BotError>(())
                        }
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut stamps = timestamps.lock().await.clone();
        stamps.sort();
        assert!(stamps[3].duration_since(stamps[0]) >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn higher_priority_tasks_dispatch_first() {
        let scheduler = Arc::new(RequestScheduler::new(test_limits(1)));
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let record = |label: &'static str| {
            let order = Arc::clone(&order);
            move || {
                let order = Arc::clone(&order);
                async move {
                    order.lock().await.push(label);
                    Ok::<_, BotError>(())
                }
            }
        };

        // The filler occupies the dispatch slot; the next two queue behind it.
        let filler = {
            let scheduler = Arc::clone(&scheduler);
            let task = record("filler");
            tokio::spawn(async move { scheduler.execute(TaskPriority::Normal, task).await })
        };
        tokio::task::yield_now().await;

        let background = {
            let scheduler = Arc::clone(&scheduler);
            let task = record("background");
            tokio::spawn(async move { scheduler.execute(TaskPriority::Background, task).await })
        };
        tokio::task::yield_now().await;
        let critical = {
            let scheduler = Arc::clone(&scheduler);
            let task = record("critical");
            tokio::spawn(async move { scheduler.execute(TaskPriority::Critical, task).await })
        };

        filler.await.unwrap().unwrap();
        background.await.unwrap().unwrap();
        critical.await.unwrap().unwrap();

        let order = order.lock().await.clone();
        let bg_pos = order.iter().position(|l| *l == "background").unwrap();
        let crit_pos = order.iter().position(|l| *l == "critical").unwrap();
        assert!(crit_pos < bg_pos, "dispatch order was {order:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_task_is_requeued_after_cooldown() {
        let scheduler = RequestScheduler::new(test_limits(10));
        let calls = Arc::new(AtomicU32::new(0));

        let started = Instant::now();
        let calls_in = Arc::clone(&calls);
        let result = scheduler
            .execute(TaskPriority::Normal, move || {
                let calls = Arc::clone(&calls_in);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(BotError::RateLimited {
                            message: "429".to_string(),
                            retry_after: None,
                        })
                    } else {
                        Ok(99u64)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(3), "cooldown was not applied");
        assert_eq!(scheduler.stats().await.rate_limit_hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_propagate_without_retry() {
        let scheduler = RequestScheduler::new(test_limits(10));
        let calls = Arc::new(AtomicU32::new(0));

        let calls_in = Arc::clone(&calls);
        let result: BotResult<()> = scheduler
            .execute(TaskPriority::Normal, move || {
                let calls = Arc::clone(&calls_in);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(BotError::Network {
                        message: "connection refused".to_string(),
                        source: None,
                        retry_count: 0,
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(BotError::Network { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.stats().await.total_failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_delay_grows_with_utilization() {
        let limits = RateLimits {
            requests_per_second: 100,
            requests_per_minute: 10,
            burst_limit: 100,
            burst_window: Duration::from_secs(10),
            rate_limit_cooldown: Duration::from_secs(3),
        };
        let scheduler = RequestScheduler::new(limits);
        let min = Duration::from_millis(1_000);
        let max = Duration::from_millis(11_000);

        let idle = scheduler.recommended_scan_delay(min, max).await;
        assert_eq!(idle, min);

        for _ in 0..5 {
            scheduler
                .execute(TaskPriority::Normal, || async { Ok::<_, BotError>(()) })
                .await
                .unwrap();
        }
        let busy = scheduler.recommended_scan_delay(min, max).await;
        assert!(busy > idle);
        assert!(busy <= max);
    }
}
