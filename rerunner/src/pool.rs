//! Bounded worker pool draining a FIFO command queue.
//!
//! A fixed set of worker threads pops jobs from a shared queue; completions
//! stream back to the calling thread over a channel. The calling thread is
//! the only mutator of cycle bookkeeping, so no state is shared between
//! workers beyond the queue itself. A cycle is finished exactly when the
//! queue is empty and every worker has exited, which the scope join
//! guarantees without any polling.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;

/// Drain `jobs` through at most `limit` concurrent invocations of `work`.
///
/// Jobs are admitted in queue (FIFO) order. `on_complete` runs on the
/// calling thread, in completion order, while workers are still running; it
/// may freely mutate caller state. Returns once the queue is empty and
/// every worker has finished.
///
/// A `limit` of zero is treated as one.
pub fn drain<J, R, W, C>(jobs: Vec<J>, limit: usize, work: W, mut on_complete: C)
where
    J: Send,
    R: Send,
    W: Fn(J) -> R + Send + Sync,
    C: FnMut(R),
{
    if jobs.is_empty() {
        return;
    }
    let workers = limit.max(1).min(jobs.len());
    let queue = Mutex::new(VecDeque::from(jobs));
    let (done_tx, done_rx) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..workers {
            let done_tx = done_tx.clone();
            let queue = &queue;
            let work = &work;
            scope.spawn(move || {
                loop {
                    let job = {
                        let Ok(mut pending) = queue.lock() else {
                            break;
                        };
                        pending.pop_front()
                    };
                    let Some(job) = job else { break };
                    if done_tx.send(work(job)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(done_tx);

        for result in done_rx {
            on_complete(result);
        }
    });
}
