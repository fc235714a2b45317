//! Background worker pool for CPU-bound decode work.
//!
//! The I/O path submits a closure and awaits a [`DecodeHandle`]; the
//! closure runs on one of a fixed set of OS threads fed by a bounded
//! kanal channel, so decode never occupies an I/O-scheduling thread and
//! one slow decode cannot stall unrelated fetches. Each submission gets
//! its own oneshot result channel: results reach only the submitting
//! caller, and a failed or panicked job fails that caller alone.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{DecodeError, DecodeResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of decode workers.
pub struct DecodePool {
    tx: Option<kanal::Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl DecodePool {
    /// Spawn `workers` decode threads with a queue of `queue_depth` jobs.
    ///
    /// Both values are clamped to at least 1.
    #[must_use]
    pub fn new(workers: usize, queue_depth: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = kanal::bounded::<Job>(queue_depth.max(1));

        let handles = (0..workers)
            .map(|i| {
                let rx = rx.clone();
                thread::Builder::new()
                    .name(format!("remora-decode-{i}"))
                    .spawn(move || worker_loop(&rx))
                    .expect("spawn decode worker thread")
            })
            .collect();

        Self {
            tx: Some(tx),
            workers: handles,
        }
    }

    /// Pool sized to the machine, with a small queue.
    #[must_use]
    pub fn with_default_size() -> Self {
        let workers = thread::available_parallelism().map_or(2, |n| n.get());
        Self::new(workers, workers * 2)
    }

    /// Submit a unit of work; the handle resolves when it completes.
    ///
    /// Suspends only logically: awaiting the handle parks the task, not a
    /// runtime thread. Backpressure applies at submission if the queue is
    /// full (the async send waits).
    pub async fn submit<T, F>(&self, f: F) -> DecodeHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> DecodeResult<T> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            let out = catch_unwind(AssertUnwindSafe(f)).unwrap_or(Err(DecodeError::Panicked));
            // Receiver may have been dropped; nothing to do then.
            let _ = result_tx.send(out);
        });

        let Some(tx) = &self.tx else {
            return DecodeHandle::closed();
        };
        if tx.as_async().send(job).await.is_err() {
            return DecodeHandle::closed();
        }
        DecodeHandle { rx: result_rx }
    }
}

impl Drop for DecodePool {
    fn drop(&mut self) {
        // Closing the channel ends the worker loops.
        drop(self.tx.take());
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(rx: &kanal::Receiver<Job>) {
    trace!("decode worker started");
    while let Ok(job) = rx.recv() {
        job();
    }
    trace!("decode worker stopped");
}

/// Pending result of one submitted decode job.
pub struct DecodeHandle<T> {
    rx: oneshot::Receiver<DecodeResult<T>>,
}

impl<T> DecodeHandle<T> {
    fn closed() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(DecodeError::PoolClosed));
        Self { rx }
    }

    /// Wait for the job to finish.
    pub async fn join(self) -> DecodeResult<T> {
        self.rx.await.unwrap_or(Err(DecodeError::PoolClosed))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn submit_and_join() {
        let pool = DecodePool::new(2, 4);
        let handle = pool.submit(|| Ok(21 * 2)).await;
        assert_eq!(handle.join().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn jobs_run_on_worker_threads() {
        let pool = DecodePool::new(1, 1);
        let handle = pool
            .submit(|| {
                Ok(thread::current()
                    .name()
                    .unwrap_or_default()
                    .starts_with("remora-decode-"))
            })
            .await;
        assert!(handle.join().await.unwrap());
    }

    #[tokio::test]
    async fn failure_reaches_only_its_caller() {
        let pool = DecodePool::new(2, 4);
        let bad = pool
            .submit(|| Err::<(), _>(DecodeError::failed("corrupt tile")))
            .await;
        let good = pool.submit(|| Ok(7)).await;

        assert_eq!(
            bad.join().await.unwrap_err(),
            DecodeError::Failed("corrupt tile".into())
        );
        assert_eq!(good.join().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn panic_surfaces_and_worker_survives() {
        let pool = DecodePool::new(1, 2);
        let panicking = pool.submit(|| -> DecodeResult<()> { panic!("boom") }).await;
        assert_eq!(panicking.join().await.unwrap_err(), DecodeError::Panicked);

        // Same single worker still processes new jobs.
        let next = pool.submit(|| Ok("alive")).await;
        assert_eq!(next.join().await.unwrap(), "alive");
    }

    #[tokio::test]
    async fn many_concurrent_submissions() {
        let pool = Arc::new(DecodePool::new(4, 8));
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..32usize {
            let counter = counter.clone();
            let handle = pool
                .submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(i)
                })
                .await;
            handles.push((i, handle));
        }

        for (i, handle) in handles {
            assert_eq!(handle.join().await.unwrap(), i);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }
}
