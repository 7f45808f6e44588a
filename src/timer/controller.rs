use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{TickOutcome, TimerState};
use crate::{log_debug, log_info, workspace::SessionWorkspace};

const ENABLE_LOGS: bool = true;

/// Receives the freewrite countdown's progress.
pub trait TimerListener: Send + Sync {
    fn on_tick(&self, elapsed_seconds: u32);
    fn on_complete(&self);
}

impl TimerListener for SessionWorkspace {
    fn on_tick(&self, elapsed_seconds: u32) {
        self.on_timer_tick(elapsed_seconds);
    }

    fn on_complete(&self) {
        self.on_timer_complete();
    }
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Freewrite countdown ticking once per second.
///
/// Each tick with time left reports the elapsed seconds to the listener.
/// The tick that reaches zero reports the full duration and then completes
/// the listener exactly once.
#[derive(Clone)]
pub struct FreewriteTimer {
    state: Arc<Mutex<TimerState>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    listener: Arc<dyn TimerListener>,
    tick_interval: Duration,
    state_tx: watch::Sender<TimerState>,
}

impl FreewriteTimer {
    pub fn new(duration: Duration, listener: Arc<dyn TimerListener>) -> Self {
        let seconds = u32::try_from(duration.as_secs()).unwrap_or(u32::MAX);
        let initial = TimerState::new(seconds);
        let (state_tx, _) = watch::channel(initial.clone());

        Self {
            state: Arc::new(Mutex::new(initial)),
            ticker: Arc::new(Mutex::new(None)),
            listener,
            tick_interval: Duration::from_secs(1),
            state_tx,
        }
    }

    pub async fn state(&self) -> TimerState {
        self.state.lock().await.clone()
    }

    /// Latest state after every transition and tick.
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state_tx.subscribe()
    }

    /// Starts or resumes. Returns false when the timer cannot start: it is
    /// already running, or it has completed and must be reset first.
    pub async fn start(&self) -> bool {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.start() {
                return false;
            }
            state.clone()
        };

        self.spawn_ticker().await;
        log_info!(
            "Freewrite timer started with {} remaining",
            snapshot.display_remaining()
        );
        self.state_tx.send_replace(snapshot);
        true
    }

    pub async fn pause(&self) -> bool {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.pause() {
                return false;
            }
            state.clone()
        };

        self.stop_ticker().await;
        self.state_tx.send_replace(snapshot);
        true
    }

    pub async fn reset(&self) {
        self.stop_ticker().await;
        let snapshot = {
            let mut state = self.state.lock().await;
            state.reset();
            state.clone()
        };
        self.state_tx.send_replace(snapshot);
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(previous) = ticker_guard.take() {
            previous.cancel_token.cancel();
            previous.handle.abort();
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(
            Arc::clone(&self.state),
            Arc::clone(&self.listener),
            self.state_tx.clone(),
            self.tick_interval,
            cancel_token.clone(),
        ));

        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    async fn stop_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.cancel_token.cancel();
            let _ = ticker.handle.await;
        }
    }
}

async fn tick_loop(
    state: Arc<Mutex<TimerState>>,
    listener: Arc<dyn TimerListener>,
    state_tx: watch::Sender<TimerState>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
) {
    // First tick one full interval after start, not immediately.
    let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let (outcome, snapshot) = {
                    let mut guard = state.lock().await;
                    (guard.tick(), guard.clone())
                };

                match outcome {
                    TickOutcome::Elapsed(elapsed) => {
                        listener.on_tick(elapsed);
                        state_tx.send_replace(snapshot);
                    }
                    TickOutcome::Completed => {
                        listener.on_tick(snapshot.duration_seconds);
                        listener.on_complete();
                        log_info!(
                            "Freewrite timer completed after {}",
                            snapshot.display_elapsed()
                        );
                        state_tx.send_replace(snapshot);
                        break;
                    }
                    TickOutcome::Ignored => break,
                }
            }
            _ = cancel_token.cancelled() => {
                log_debug!("Freewrite ticker stopped");
                break;
            }
        }
    }
}
