//! Per-scope debounced commits.
//!
//! Each scope key owns at most one armed timer. Re-scheduling a key aborts
//! its armed timer and arms a new one carrying the newer commit. When a timer
//! fires the commit runs on its own task, so later re-scheduling never aborts
//! a write that is already on the wire. Commits for the same key never
//! overlap: one fired while another is in flight waits in a single queued
//! slot (newest wins) and starts once the in-flight one finishes.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{task::JoinHandle, time};

type Commit = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct Scope {
    generation: u64,
    timer: Option<JoinHandle<()>>,
    in_flight: bool,
    queued: Option<Commit>,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            generation: 0,
            timer: None,
            in_flight: false,
            queued: None,
        }
    }
}

struct Timeline<K> {
    scopes: HashMap<K, Scope>,
    closed: bool,
}

type SharedTimeline<K> = Arc<Mutex<Timeline<K>>>;

fn lock<K>(timeline: &SharedTimeline<K>) -> MutexGuard<'_, Timeline<K>> {
    timeline.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Debouncer<K> {
    timeline: SharedTimeline<K>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            timeline: Arc::new(Mutex::new(Timeline {
                scopes: HashMap::new(),
                closed: false,
            })),
        }
    }

    /// Arms `commit` to run once `key` has been quiet for `delay`, replacing
    /// whatever was armed for `key` before.
    pub fn schedule<F>(&self, key: K, delay: Duration, commit: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut timeline = lock(&self.timeline);
        if timeline.closed {
            return;
        }

        let scope = timeline.scopes.entry(key.clone()).or_default();
        scope.generation += 1;
        let generation = scope.generation;
        if let Some(previous) = scope.timer.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.timeline);
        let commit: Commit = Box::pin(commit);
        scope.timer = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            fire(&shared, key, generation, commit);
        }));
    }

    /// Disarms any timer for `key` and dispatches `commit` right away, still
    /// honouring the one-in-flight rule.
    pub fn fire_now<F>(&self, key: K, commit: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut timeline = lock(&self.timeline);
        if timeline.closed {
            return;
        }

        let scope = timeline.scopes.entry(key.clone()).or_default();
        scope.generation += 1;
        if let Some(previous) = scope.timer.take() {
            previous.abort();
        }
        dispatch(&self.timeline, scope, key, Box::pin(commit));
    }

    /// Drops every armed timer and queued commit. Commits already in flight
    /// run to completion. Nothing can be scheduled afterwards.
    pub fn cancel_all(&self) -> usize {
        let mut timeline = lock(&self.timeline);
        timeline.closed = true;

        let mut dropped = 0;
        for scope in timeline.scopes.values_mut() {
            if let Some(timer) = scope.timer.take() {
                timer.abort();
                dropped += 1;
            }
            if scope.queued.take().is_some() {
                dropped += 1;
            }
        }
        dropped
    }

    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.timeline)
            .scopes
            .get(key)
            .map_or(false, |scope| scope.timer.is_some() || scope.in_flight)
    }

    /// True when no timer is armed and no commit is running or queued.
    pub fn is_idle(&self) -> bool {
        lock(&self.timeline)
            .scopes
            .values()
            .all(|scope| scope.timer.is_none() && !scope.in_flight)
    }
}

impl<K> Default for Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        let mut timeline = lock(&self.timeline);
        timeline.closed = true;
        for scope in timeline.scopes.values_mut() {
            if let Some(timer) = scope.timer.take() {
                timer.abort();
            }
            scope.queued = None;
        }
    }
}

fn fire<K>(timeline: &SharedTimeline<K>, key: K, generation: u64, commit: Commit)
where
    K: Eq + Hash + Clone + Send + 'static,
{
    let mut guard = lock(timeline);
    if guard.closed {
        return;
    }
    let Some(scope) = guard.scopes.get_mut(&key) else {
        return;
    };
    // A newer schedule raced this timer past its sleep.
    if scope.generation != generation {
        return;
    }
    scope.timer = None;
    dispatch(timeline, scope, key, commit);
}

fn dispatch<K>(timeline: &SharedTimeline<K>, scope: &mut Scope, key: K, commit: Commit)
where
    K: Eq + Hash + Clone + Send + 'static,
{
    if scope.in_flight {
        scope.queued = Some(commit);
        return;
    }
    scope.in_flight = true;
    tokio::spawn(drain(Arc::clone(timeline), key, commit));
}

async fn drain<K>(timeline: SharedTimeline<K>, key: K, first: Commit)
where
    K: Eq + Hash + Clone + Send + 'static,
{
    let mut next = Some(first);
    while let Some(commit) = next {
        commit.await;
        next = {
            let mut guard = lock(&timeline);
            match guard.scopes.get_mut(&key) {
                Some(scope) => {
                    let queued = scope.queued.take();
                    if queued.is_none() {
                        scope.in_flight = false;
                    }
                    queued
                }
                None => None,
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Commit) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handle = Arc::clone(&log);
        let make = move |value: &str| -> Commit {
            let log = Arc::clone(&handle);
            let value = value.to_string();
            Box::pin(async move {
                log.lock().unwrap().push(value);
            })
        };
        (log, make)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_into_last_value() {
        let debouncer = Debouncer::new();
        let (log, commit) = recorder();

        for value in ["l", "li", "lig", "ligh", "light"] {
            debouncer.schedule("anchor-3", Duration::from_millis(500), commit(value));
            time::sleep(Duration::from_millis(200)).await;
        }
        assert!(log.lock().unwrap().is_empty());

        time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*log.lock().unwrap(), vec!["light".to_string()]);
        assert!(debouncer.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_keys_have_independent_timelines() {
        let debouncer = Debouncer::new();
        let (log, commit) = recorder();

        debouncer.schedule("box", Duration::from_millis(1000), commit("box text"));
        debouncer.schedule("slot", Duration::from_millis(500), commit("slot text"));

        time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*log.lock().unwrap(), vec!["slot text".to_string()]);
        assert!(debouncer.is_pending(&"box"));

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn commits_for_one_key_never_overlap() {
        let debouncer = Debouncer::new();
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let slow_commit = || {
            let running = Arc::clone(&running);
            let max_seen = Arc::clone(&max_seen);
            let finished = Arc::clone(&finished);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                time::sleep(Duration::from_millis(2000)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                finished.fetch_add(1, Ordering::SeqCst);
            }
        };

        debouncer.schedule("draft", Duration::from_millis(100), slow_commit());
        time::sleep(Duration::from_millis(200)).await;
        // Fires while the first commit is still on the wire.
        debouncer.schedule("draft", Duration::from_millis(100), slow_commit());
        time::sleep(Duration::from_millis(200)).await;
        assert!(debouncer.is_pending(&"draft"));

        time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 2);
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(debouncer.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn only_newest_queued_commit_survives() {
        let debouncer = Debouncer::new();
        let (log, commit) = recorder();
        let gate = Arc::new(tokio::sync::Notify::new());
        let opened = Arc::clone(&gate);

        debouncer.fire_now("draft", async move { opened.notified().await });
        debouncer.fire_now("draft", commit("second"));
        debouncer.fire_now("draft", commit("third"));

        gate.notify_one();
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*log.lock().unwrap(), vec!["third".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_drops_armed_timers() {
        let debouncer = Debouncer::new();
        let (log, commit) = recorder();

        debouncer.schedule("box", Duration::from_millis(1000), commit("lost"));
        assert_eq!(debouncer.cancel_all(), 1);

        debouncer.schedule("box", Duration::from_millis(10), commit("after close"));
        time::sleep(Duration::from_millis(2000)).await;
        assert!(log.lock().unwrap().is_empty());
    }
}
