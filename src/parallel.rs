//! # Order-parallel execution
//!
//! Every harmonic order owns a disjoint output slot (a column of coefficients
//! or a lumped-coefficient accumulator), so the order loop needs no locking
//! and its result does not depend on the number of threads or on scheduling.
//!
//! Scratch memory (recurrence coefficients, Legendre columns) is private to
//! each rayon task and allocated fallibly. A failed allocation increments a
//! shared counter and raises a cancel flag; the remaining tasks stop picking
//! up work and the whole loop returns
//! [`ShError::ScratchAllocation`] with the number of failed tasks. Outputs
//! are unspecified after such an error.
use std::collections::TryReserveError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::warn;

use crate::config::ShConfig;
use crate::sh_errors::ShError;

/// Run `op` on a dedicated pool of `config.num_threads` threads, or on the
/// global rayon pool when unset.
pub fn install<R, F>(config: &ShConfig, op: F) -> Result<R, ShError>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match config.num_threads {
        None => Ok(op()),
        Some(n) => {
            let pool = ThreadPoolBuilder::new().num_threads(n).build()?;
            Ok(pool.install(op))
        }
    }
}

/// Process `slots[m]` for every order `m` in parallel.
///
/// Arguments
/// -----------------
/// * `slots` – one output slot per order.
/// * `init` – builds the per-task scratch, reporting allocation failures.
/// * `body` – `body(scratch, m, slot)`; must only write to `slot`.
///
/// Return
/// ----------
/// * `Err(ShError::ScratchAllocation)` if any task failed to get its scratch.
pub fn for_each_order<T, S, I, B>(slots: &mut [T], init: I, body: B) -> Result<(), ShError>
where
    T: Send,
    S: Send,
    I: Fn() -> Result<S, TryReserveError> + Sync,
    B: Fn(&mut S, usize, &mut T) + Sync,
{
    let failed = AtomicUsize::new(0);
    let cancel = AtomicBool::new(false);

    slots.par_iter_mut().enumerate().for_each_init(
        || match init() {
            Ok(scratch) => Some(scratch),
            Err(err) => {
                warn!(%err, "scratch allocation failed");
                failed.fetch_add(1, Ordering::Relaxed);
                cancel.store(true, Ordering::Relaxed);
                None
            }
        },
        |scratch, (m, slot)| {
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            if let Some(scratch) = scratch {
                body(scratch, m, slot);
            }
        },
    );

    match failed.load(Ordering::Relaxed) {
        0 => Ok(()),
        failed_tasks => Err(ShError::ScratchAllocation { failed_tasks }),
    }
}

/// [`for_each_order`] over consecutive chunks of `data`: `body(scratch, k, chunk)`
/// receives chunk `k = 0, 1, …` of length `chunk_len` (the last one may be shorter).
pub fn for_each_chunk<T, S, I, B>(
    data: &mut [T],
    chunk_len: usize,
    init: I,
    body: B,
) -> Result<(), ShError>
where
    T: Send,
    S: Send,
    I: Fn() -> Result<S, TryReserveError> + Sync,
    B: Fn(&mut S, usize, &mut [T]) + Sync,
{
    let mut chunks: Vec<&mut [T]> = data.chunks_mut(chunk_len.max(1)).collect();
    for_each_order(&mut chunks, init, |scratch, k, chunk| body(scratch, k, chunk))
}
