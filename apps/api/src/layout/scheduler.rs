//! Debounced layout recomputation.
//!
//! Every edit to a CV schedules a fresh layout. Requests for the same CV that arrive
//! within the debounce window replace each other (trailing edge), so a burst of
//! keystrokes costs one computation. The computation itself is CPU-bound and runs on
//! the blocking pool so the async executor stays responsive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::layout::page_break::LayoutConfig;
use crate::layout::preview::{compute_preview, PreviewLayout};
use crate::models::cv::{CvDocument, Template};

/// A computed preview and the document revision it was computed from.
#[derive(Debug, Clone)]
pub struct ScheduledPreview {
    pub revision: DateTime<Utc>,
    pub preview: PreviewLayout,
}

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    debounce: Duration,
    config: LayoutConfig,
    pending: Mutex<HashMap<Uuid, Pending>>,
    results: RwLock<HashMap<Uuid, Arc<ScheduledPreview>>>,
    next_generation: AtomicU64,
    computations: AtomicU64,
    published: watch::Sender<u64>,
}

#[derive(Clone)]
pub struct LayoutScheduler {
    inner: Arc<Inner>,
}

impl LayoutScheduler {
    pub fn new(debounce: Duration, config: LayoutConfig) -> Self {
        let (published, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                debounce,
                config,
                pending: Mutex::new(HashMap::new()),
                results: RwLock::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                computations: AtomicU64::new(0),
                published,
            }),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.inner.config
    }

    /// Schedules a layout for `cv_id`, cancelling any request still waiting out its debounce.
    pub fn schedule(&self, cv_id: Uuid, revision: DateTime<Utc>, document: CvDocument, template: Template) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let inner = Arc::clone(&self.inner);

        // Held across the spawn so the task cannot publish before it is registered.
        let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());

        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;

            let config = inner.config;
            let computed =
                tokio::task::spawn_blocking(move || compute_preview(&document, template, &config)).await;

            match computed {
                Ok(preview) => inner.publish(cv_id, generation, ScheduledPreview { revision, preview }),
                Err(e) => warn!(%cv_id, "layout computation failed: {e}"),
            }
        });

        if let Some(previous) = pending.insert(cv_id, Pending { generation, handle }) {
            debug!(%cv_id, superseded = previous.generation, "coalescing layout request");
            previous.handle.abort();
        }
    }

    /// Latest published preview for `cv_id`, if it was computed from `revision`.
    pub fn latest(&self, cv_id: Uuid, revision: DateTime<Utc>) -> Option<Arc<ScheduledPreview>> {
        let results = self.inner.results.read().unwrap_or_else(|e| e.into_inner());
        results
            .get(&cv_id)
            .filter(|scheduled| scheduled.revision == revision)
            .cloned()
    }

    /// Drops pending work and cached output for a CV (e.g. after deletion).
    pub fn forget(&self, cv_id: Uuid) {
        if let Some(pending) = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&cv_id)
        {
            pending.handle.abort();
        }
        self.inner
            .results
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&cv_id);
    }

    /// Yields a counter that increments on every published preview.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.published.subscribe()
    }

    pub fn is_pending(&self, cv_id: Uuid) -> bool {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&cv_id)
    }

    /// Like `latest`, but while a layout for `cv_id` is still pending, waits up to
    /// `timeout` for it to publish.
    pub async fn await_latest(
        &self,
        cv_id: Uuid,
        revision: DateTime<Utc>,
        timeout: Duration,
    ) -> Option<Arc<ScheduledPreview>> {
        // Subscribed before the first check so a publication in between is not missed.
        let mut rx = self.subscribe();
        let wait = async {
            loop {
                if let Some(found) = self.latest(cv_id, revision) {
                    return Some(found);
                }
                if !self.is_pending(cv_id) || rx.changed().await.is_err() {
                    return None;
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }

    /// Number of layouts computed and published so far.
    pub fn computations(&self) -> u64 {
        self.inner.computations.load(Ordering::Relaxed)
    }
}

impl Inner {
    fn publish(&self, cv_id: Uuid, generation: u64, scheduled: ScheduledPreview) {
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            match pending.get(&cv_id) {
                Some(current) if current.generation == generation => {
                    pending.remove(&cv_id);
                }
                _ => {
                    debug!(%cv_id, generation, "discarding stale layout");
                    return;
                }
            }
        }

        debug!(
            %cv_id,
            pages = scheduled.preview.layout.page_count,
            pushed = scheduled.preview.layout.margins.len(),
            "layout published"
        );
        self.results
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(cv_id, Arc::new(scheduled));
        self.computations.fetch_add(1, Ordering::Relaxed);
        self.published.send_modify(|count| *count += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn revision(n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap()
    }

    fn doc(summary: &str) -> CvDocument {
        CvDocument {
            summary: summary.to_string(),
            ..Default::default()
        }
    }

    async fn wait_for(rx: &mut watch::Receiver<u64>, target: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while *rx.borrow_and_update() < target {
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("layout was never published");
    }

    #[tokio::test]
    async fn test_burst_of_requests_is_computed_once() {
        let scheduler = LayoutScheduler::new(Duration::from_millis(40), LayoutConfig::default());
        let mut rx = scheduler.subscribe();
        let id = Uuid::new_v4();

        scheduler.schedule(id, revision(1), doc("one"), Template::Classic);
        scheduler.schedule(id, revision(2), doc("two"), Template::Classic);
        scheduler.schedule(id, revision(3), doc("three"), Template::Classic);

        wait_for(&mut rx, 1).await;
        // Give any (incorrectly) surviving task time to publish.
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(scheduler.computations(), 1);
        assert!(scheduler.latest(id, revision(3)).is_some());
        assert!(scheduler.latest(id, revision(1)).is_none());
    }

    #[tokio::test]
    async fn test_different_cvs_do_not_cancel_each_other() {
        let scheduler = LayoutScheduler::new(Duration::from_millis(10), LayoutConfig::default());
        let mut rx = scheduler.subscribe();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        scheduler.schedule(a, revision(1), doc("a"), Template::Classic);
        scheduler.schedule(b, revision(1), doc("b"), Template::Modern);

        wait_for(&mut rx, 2).await;
        assert_eq!(scheduler.computations(), 2);
        assert_eq!(scheduler.latest(b, revision(1)).unwrap().preview.template, Template::Modern);
    }

    #[tokio::test]
    async fn test_await_latest_waits_for_pending_layout() {
        let scheduler = LayoutScheduler::new(Duration::from_millis(30), LayoutConfig::default());
        let id = Uuid::new_v4();

        scheduler.schedule(id, revision(1), doc("x"), Template::Classic);
        assert!(scheduler.is_pending(id));
        assert!(scheduler.latest(id, revision(1)).is_none());

        let found = scheduler
            .await_latest(id, revision(1), Duration::from_secs(5))
            .await;
        assert_eq!(found.unwrap().revision, revision(1));
        assert!(!scheduler.is_pending(id));
    }

    #[tokio::test]
    async fn test_await_latest_returns_immediately_when_idle() {
        let scheduler = LayoutScheduler::new(Duration::from_millis(10), LayoutConfig::default());
        let started = tokio::time::Instant::now();
        let found = scheduler
            .await_latest(Uuid::new_v4(), revision(1), Duration::from_secs(5))
            .await;
        assert!(found.is_none());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_forget_cancels_and_clears() {
        let scheduler = LayoutScheduler::new(Duration::from_millis(10), LayoutConfig::default());
        let mut rx = scheduler.subscribe();
        let id = Uuid::new_v4();

        scheduler.schedule(id, revision(1), doc("x"), Template::Classic);
        wait_for(&mut rx, 1).await;
        assert!(scheduler.latest(id, revision(1)).is_some());

        scheduler.forget(id);
        assert!(scheduler.latest(id, revision(1)).is_none());

        scheduler.schedule(id, revision(2), doc("y"), Template::Classic);
        scheduler.forget(id);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(scheduler.computations(), 1);
    }
}
