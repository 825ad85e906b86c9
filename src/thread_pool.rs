use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::error::Result;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// the error returned by [`BoundedThreadPool::try_spawn`] when the pending queue is full
#[derive(Debug, Error)]
#[error("worker pool queue is full")]
pub struct Rejected;

/// A fixed-size worker pool fed by one bounded job queue.
///
/// This implementation uses the MPMC [`channel`] provided by the crossbeam crate, with
/// a fixed capacity. The single producer is the accept loop, and the workers in the
/// pool are the consumers. Submission never blocks: once the queue holds `capacity`
/// not-yet-claimed jobs, further submissions are rejected immediately and the caller
/// keeps ownership of whatever resource the job was wrapping. This sheds load during
/// bursts instead of letting pending connections pile up without bound.
///
/// Each worker drains the queue one job at a time and runs it to completion, so at
/// most `workers` jobs are in flight and at most `capacity` are buffered. If a job
/// panics, the worker's thread is replaced with a fresh one carrying the same ordinal,
/// keeping the pool at full strength. Workers run until the pool itself is dropped.
///
/// [`channel`]: https://docs.rs/crossbeam/0.8.1/crossbeam/channel/index.html
pub struct BoundedThreadPool {
    /// the sending part of the channel
    tx: Sender<Job>,
}

impl BoundedThreadPool {
    /// Creates a pool of `workers` threads sharing one queue of the given `capacity`.
    /// Every worker gets a 1-based ordinal used in its thread name and log lines.
    ///
    /// # Errors
    /// returns [`DictError::Io`] if an OS thread could not be spawned
    ///
    /// [`DictError::Io`]: ../error/enum.DictError.html
    pub fn new(workers: u32, capacity: usize) -> Result<Self> {
        let (tx, rx) = channel::bounded::<Job>(capacity);
        for ordinal in 1..=workers {
            let worker = Worker {
                ordinal,
                rx: rx.clone(),
            };
            thread::Builder::new()
                .name(format!("worker-{}", ordinal))
                .spawn(move || drain(worker))?;
        }
        Ok(BoundedThreadPool { tx })
    }

    /// Submits `job` to the pool without blocking.
    ///
    /// # Errors
    /// returns [`Rejected`] if the queue is already at capacity (or the workers are
    /// gone); the job is dropped, releasing anything it owned
    pub fn try_spawn<F>(&self, job: F) -> std::result::Result<(), Rejected>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.try_send(Box::new(job)).map_err(|_| Rejected)
    }
}

/// One worker's identity plus its handle on the shared queue. Dropping a `Worker`
/// while panicking respawns a replacement thread under the same ordinal.
#[derive(Clone)]
struct Worker {
    ordinal: u32,
    rx: Receiver<Job>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        if thread::panicking() {
            debug!("worker {} panicked, starting a replacement", self.ordinal);
            let worker = self.clone();
            let name = format!("worker-{}", worker.ordinal);
            if let Err(e) = thread::Builder::new().name(name).spawn(move || drain(worker)) {
                error!("failed to respawn worker {}: {}", self.ordinal, e);
            }
        }
    }
}

/// the worker loop: block until a job is queued, claim exactly one, run it to
/// completion, repeat. Exits when the queue disconnects (the pool was dropped).
fn drain(worker: Worker) {
    loop {
        debug!(
            "worker {} waiting, request(s) in queue: {}",
            worker.ordinal,
            worker.rx.len()
        );
        match worker.rx.recv() {
            Ok(job) => {
                info!("worker {} running new request", worker.ordinal);
                job();
            }
            Err(_) => {
                debug!("worker {} exiting, the pool was dropped", worker.ordinal);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use std::time::Duration;

    #[test]
    fn jobs_run_to_completion() {
        let pool = BoundedThreadPool::new(2, 4).unwrap();
        let (done_tx, done_rx) = unbounded();
        for i in 0..4 {
            let done_tx = done_tx.clone();
            pool.try_spawn(move || done_tx.send(i).unwrap()).unwrap();
        }
        let mut seen: Vec<i32> = (0..4)
            .map(|_| done_rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn full_queue_rejects_without_blocking() {
        let pool = BoundedThreadPool::new(1, 1).unwrap();
        let (release_tx, release_rx) = unbounded::<()>();
        let (running_tx, running_rx) = unbounded::<()>();

        // park the only worker until released
        pool.try_spawn(move || {
            running_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        })
        .unwrap();
        running_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // worker is busy: one job fits in the queue, the next is shed immediately
        pool.try_spawn(|| {}).unwrap();
        assert!(pool.try_spawn(|| {}).is_err());

        // releasing the worker drains the queued job and frees capacity again
        release_tx.send(()).unwrap();
        let (done_tx, done_rx) = unbounded::<()>();
        loop {
            let done_tx = done_tx.clone();
            if pool.try_spawn(move || done_tx.send(()).unwrap()).is_ok() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
}
