//! Progress of a transform over its latitude batches.
//!
//! [`BatchProgress`] is what the orchestrators drive: one [`BatchProgress::tick`]
//! per processed batch, one [`BatchProgress::finish`] at the end. It keeps
//! the slowest and the mean batch time and reports them through `tracing`
//! when the transform finishes. With the `progress` feature and
//! [`ShConfig::show_progress`](crate::config::ShConfig) set, an `indicatif`
//! bar shows the batch count, the ETA and the mean batch time.
use std::time::{Duration, Instant};

use tracing::debug;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Progress of one transform over its latitude batches.
pub struct BatchProgress {
    label: &'static str,
    started: Instant,
    last: Instant,
    done: u32,
    slowest: Duration,
    #[cfg(feature = "progress")]
    bar: Option<ProgressBar>,
}

impl BatchProgress {
    /// Start tracking `total` batches; the bar is drawn only if `show` is set
    /// and the crate is built with the `progress` feature.
    #[cfg_attr(not(feature = "progress"), allow(unused_variables))]
    pub fn new(label: &'static str, total: usize, show: bool) -> Self {
        #[cfg(feature = "progress")]
        let bar = show.then(|| {
            let pb = ProgressBar::new((total as u64).max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "{prefix} {bar:40.cyan/blue} {pos}/{len} batches | ETA {eta_precise} | {msg}",
            ) {
                pb.set_style(style);
            }
            pb.set_prefix(label);
            pb
        });

        let now = Instant::now();
        BatchProgress {
            label,
            started: now,
            last: now,
            done: 0,
            slowest: Duration::ZERO,
            #[cfg(feature = "progress")]
            bar,
        }
    }

    /// Mark one batch as done.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.slowest = self.slowest.max(now - self.last);
        self.last = now;
        self.done += 1;

        #[cfg(feature = "progress")]
        if let Some(pb) = &self.bar {
            pb.set_message(format!("mean {:.2?}/batch", self.mean()));
            pb.inc(1);
        }
    }

    /// Number of batches marked as done.
    pub fn done(&self) -> u32 {
        self.done
    }

    /// Mean time per finished batch, zero before the first one.
    pub fn mean(&self) -> Duration {
        match self.done {
            0 => Duration::ZERO,
            n => (self.last - self.started) / n,
        }
    }

    pub fn finish(self) {
        #[cfg(feature = "progress")]
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
        debug!(
            transform = self.label,
            batches = self.done,
            elapsed = ?(self.last - self.started),
            mean_batch = ?self.mean(),
            slowest_batch = ?self.slowest,
            "transform finished"
        );
    }
}
