use std::ops::ControlFlow;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// A periodic callback on its own thread, fired at a fixed rate.
///
/// Dropping the ticker cancels it: the worker wakes immediately and exits
/// without firing again. Re-arming is replacing the held `Ticker`.
pub struct Ticker {
    _stop: Sender<()>,
}

impl Ticker {
    pub fn start<F>(interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();

        std::thread::spawn(move || {
            // Each tick is due one interval after the previous deadline.
            let mut next = Instant::now() + interval;
            loop {
                match stopped.recv_timeout(next.saturating_duration_since(Instant::now())) {
                    Err(RecvTimeoutError::Timeout) => {
                        if on_tick().is_break() {
                            break;
                        }
                        next += interval;
                    }
                    // Sender dropped (or an explicit stop).
                    _ => break,
                }
            }
        });

        Self { _stop: stop }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn fires_repeatedly() {
        let (tx, rx) = mpsc::channel();
        let _ticker = Ticker::start(Duration::from_millis(10), move || {
            let _ = tx.send(Instant::now());
            ControlFlow::Continue(())
        });

        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
        }
    }

    #[test]
    fn slow_callbacks_do_not_stretch_the_period() {
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();
        let _ticker = Ticker::start(Duration::from_millis(100), move || {
            std::thread::sleep(Duration::from_millis(60));
            let _ = tx.send(());
            ControlFlow::Continue(())
        });

        for _ in 0..5 {
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
        }
        // Fixed rate: ~560ms. Restarting the wait after each call: ~800ms.
        assert!(start.elapsed() < Duration::from_millis(720), "{:?}", start.elapsed());
    }

    #[test]
    fn break_stops_the_ticker() {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let _ticker = Ticker::start(Duration::from_millis(5), move || {
            c.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Break(())
        });

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_cancels_before_next_tick() {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let ticker = Ticker::start(Duration::from_millis(200), move || {
            c.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        drop(ticker);
        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
