//! Bounded fan-out/fan-in worker pool for bulk store I/O.
//!
//! Workers pull jobs from a shared queue and send each finished record to the
//! calling thread, which is the only place results are folded together. The
//! first error stops workers from picking up further jobs; jobs already in
//! flight finish, and their results are discarded.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Host parallelism, at least one.
pub(crate) fn width() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Run `worker` over `items` on up to [`width`] threads, handing every
/// success to `consume` on the calling thread.
///
/// Returns the first error; `consume` is not called again once one is seen.
pub(crate) fn run<T, R, E, W, C>(items: Vec<T>, worker: W, mut consume: C) -> Result<(), E>
where
    T: Send,
    R: Send,
    E: Send,
    W: Fn(T) -> Result<R, E> + Sync,
    C: FnMut(R),
{
    if items.is_empty() {
        return Ok(());
    }
    let threads = width().min(items.len());

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<T>();
    for item in items {
        // Receiver is alive, unbounded send cannot fail.
        let _ = job_tx.send(item);
    }
    drop(job_tx);

    let (out_tx, out_rx) = crossbeam_channel::unbounded::<Result<R, E>>();
    let abort = AtomicBool::new(false);

    thread::scope(|scope| {
        for _ in 0..threads {
            let job_rx = job_rx.clone();
            let out_tx = out_tx.clone();
            let worker = &worker;
            let abort = &abort;
            scope.spawn(move || {
                for job in job_rx.iter() {
                    if abort.load(Ordering::Relaxed) {
                        break;
                    }
                    let result = worker(job);
                    let failed = result.is_err();
                    if out_tx.send(result).is_err() || failed {
                        abort.store(true, Ordering::Relaxed);
                        break;
                    }
                }
            });
        }
        drop(out_tx);

        let mut first_err = None;
        for result in out_rx.iter() {
            match result {
                Ok(record) if first_err.is_none() => consume(record),
                Ok(_) => {}
                Err(e) => {
                    abort.store(true, Ordering::Relaxed);
                    first_err.get_or_insert(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    })
}
