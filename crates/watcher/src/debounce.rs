//! Quiet-period debouncing
//!
//! Prevents starting a trace run for every keystroke: only the last value of a
//! burst is delivered, once, a fixed delay after the burst ends.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default quiet period
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

struct State<T> {
    /// Bumped on every notify/cancel; a timer only fires if it still matches
    generation: u64,
    pending: Option<T>,
    timer: Option<JoinHandle<()>>,
}

/// Coalesces rapid notifications into one deferred callback
///
/// Timers run on the injected runtime handle, so a paused tokio clock drives
/// them deterministically in tests.
pub struct Debouncer<T> {
    delay: Duration,
    handle: Handle,
    state: Arc<Mutex<State<T>>>,
    callback: Callback<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(delay: Duration, handle: Handle, callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            handle,
            state: Arc::new(Mutex::new(State {
                generation: 0,
                pending: None,
                timer: None,
            })),
            callback: Arc::new(callback),
        }
    }

    /// Record `value` as pending and restart the countdown
    pub fn notify(&self, value: T) {
        let deadline = Instant::now() + self.delay;
        let mut state = self.state.lock();

        state.generation = state.generation.wrapping_add(1);
        state.pending = Some(value);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        let callback = Arc::clone(&self.callback);

        state.timer = Some(self.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let value = {
                let mut state = shared.lock();
                if state.generation != generation {
                    return;
                }
                state.timer = None;
                state.pending.take()
            };

            if let Some(value) = value {
                callback(value);
            }
        }));
    }

    /// Stop the countdown without firing
    pub fn cancel_pending(&self) {
        let mut state = self.state.lock();
        state.generation = state.generation.wrapping_add(1);
        state.pending = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// True while a countdown is running
    pub fn has_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.state.lock().timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Fired = Arc<Mutex<Vec<(String, Instant)>>>;

    fn recording(delay: Duration) -> (Debouncer<String>, Fired) {
        let fired: Fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let debouncer = Debouncer::new(delay, Handle::current(), move |value: String| {
            sink.lock().push((value, Instant::now()));
        });
        (debouncer, fired)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_with_last_value() {
        let (debouncer, fired) = recording(Duration::from_millis(300));
        let start = Instant::now();

        debouncer.notify("a".to_string());
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.notify("ab".to_string());
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.notify("abc".to_string());

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(fired.lock().is_empty());
        assert!(debouncer.has_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let fired = fired.lock();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, "abc");
        let at = fired[0].1 - start;
        assert!(at >= Duration::from_millis(400) && at < Duration::from_millis(402));
        assert!(!debouncer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fire_separately() {
        let (debouncer, fired) = recording(Duration::from_millis(100));

        debouncer.notify("first".to_string());
        tokio::time::sleep(Duration::from_millis(150)).await;
        debouncer.notify("second".to_string());
        tokio::time::sleep(Duration::from_millis(150)).await;

        let values: Vec<_> = fired.lock().iter().map(|(v, _)| v.clone()).collect();
        assert_eq!(values, vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_suppresses_fire() {
        let (debouncer, fired) = recording(Duration::from_millis(100));

        debouncer.notify("x".to_string());
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.cancel_pending();
        assert!(!debouncer.has_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(fired.lock().is_empty());

        // Still usable afterwards
        debouncer.notify("y".to_string());
        tokio::time::sleep(Duration::from_millis(101)).await;
        assert_eq!(fired.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_burst_keeps_deferring() {
        let (debouncer, fired) = recording(Duration::from_millis(100));

        for i in 0..20 {
            debouncer.notify(format!("v{}", i));
            tokio::time::sleep(Duration::from_millis(90)).await;
        }
        assert!(fired.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        let fired = fired.lock();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, "v19");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_timer() {
        let (debouncer, fired) = recording(Duration::from_millis(100));
        debouncer.notify("x".to_string());
        drop(debouncer);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fired.lock().is_empty());
    }
}
