use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Receives search events. Implementations must be cheap; they run for every
/// move played.
pub trait ProgressReporter: Sync {
    fn move_played(&self) {}
    fn game_seen(&self) {}
}

impl ProgressReporter for () {}

#[derive(Debug, Default)]
pub struct Counters {
    plays: AtomicU64,
    seen: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plays(&self) -> u64 {
        self.plays.load(Ordering::Relaxed)
    }

    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for Counters {
    fn move_played(&self) {
        self.plays.fetch_add(1, Ordering::Relaxed);
    }

    fn game_seen(&self) {
        self.seen.fetch_add(1, Ordering::Relaxed);
    }
}

struct StopOnDrop<'a>(&'a AtomicBool);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Runs `f` while a background thread logs how many new games per second
/// `counters` sees, once every `interval`.
pub fn with_throughput<T>(counters: &Counters, interval: Duration, f: impl FnOnce() -> T) -> T {
    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        scope.spawn(|| {
            let step = interval.min(Duration::from_millis(50));
            let mut tick = Instant::now();
            let mut last = counters.seen();
            while !done.load(Ordering::Relaxed) {
                thread::sleep(step);
                let elapsed = tick.elapsed();
                if elapsed < interval {
                    continue;
                }
                let seen = counters.seen();
                let rate = (seen - last) as f64 / elapsed.as_secs_f64();
                log::info!(
                    "{:<32}{:>12.0} games/s {:>12} plays",
                    "throughput",
                    rate,
                    counters.plays()
                );
                last = seen;
                tick = Instant::now();
            }
        });
        let _stop = StopOnDrop(&done);
        f()
    })
}
