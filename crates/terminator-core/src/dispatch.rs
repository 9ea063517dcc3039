//! UI-thread dispatch
//!
//! The screen model is confined to the UI thread. The reader thread hands
//! each batch of actions over as a job and blocks until the UI thread has
//! run it, a rendezvous rather than a callback: the front-end only ever
//! sees fully-applied batches, and the bounded queue back-pressures the
//! reader during UI pauses instead of accumulating an unbounded action
//! list.

use std::sync::mpsc::{Receiver, SyncSender};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("the UI event loop is gone")]
    Disconnected,
}

type JobFn = Box<dyn FnOnce() + Send>;

struct Job {
    run: JobFn,
    ack: SyncSender<()>,
}

/// Submits jobs to the UI thread. Cloneable; one per producer.
#[derive(Clone)]
pub struct UiDispatcher {
    tx: SyncSender<Job>,
}

/// The UI thread's end: runs submitted jobs in order.
pub struct UiEventLoop {
    rx: Receiver<Job>,
}

/// Create a dispatcher/event-loop pair with the given queue depth.
pub fn ui_channel(depth: usize) -> (UiDispatcher, UiEventLoop) {
    let (tx, rx) = std::sync::mpsc::sync_channel(depth.max(1));
    (UiDispatcher { tx }, UiEventLoop { rx })
}

impl UiDispatcher {
    /// Submit a job and block until the UI thread has finished running it.
    pub fn invoke_and_wait<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (ack_tx, ack_rx) = std::sync::mpsc::sync_channel(1);
        self.tx
            .send(Job {
                run: Box::new(job),
                ack: ack_tx,
            })
            .map_err(|_| DispatchError::Disconnected)?;
        ack_rx.recv().map_err(|_| DispatchError::Disconnected)
    }
}

impl UiEventLoop {
    /// Run the next job. Returns false once every dispatcher is gone.
    pub fn run_one(&self) -> bool {
        match self.rx.recv() {
            Ok(job) => {
                (job.run)();
                let _ = job.ack.send(());
                true
            }
            Err(_) => false,
        }
    }

    /// Run jobs until every dispatcher is gone.
    pub fn run(&self) {
        while self.run_one() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_invoke_and_wait_blocks_until_applied() {
        let (dispatcher, event_loop) = ui_channel(2);
        let counter = Arc::new(AtomicUsize::new(0));

        let worker = {
            let counter = counter.clone();
            std::thread::spawn(move || {
                for _ in 0..3 {
                    let counter = counter.clone();
                    dispatcher
                        .invoke_and_wait(move || {
                            counter.fetch_add(1, Ordering::SeqCst);
                        })
                        .unwrap();
                }
            })
        };

        for _ in 0..3 {
            assert!(event_loop.run_one());
        }
        worker.join().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        // All dispatchers dropped with the worker.
        assert!(!event_loop.run_one());
    }

    #[test]
    fn test_disconnected_loop_reports_error() {
        let (dispatcher, event_loop) = ui_channel(1);
        drop(event_loop);
        assert!(dispatcher.invoke_and_wait(|| {}).is_err());
    }

    #[test]
    fn test_jobs_run_in_submission_order() {
        let (dispatcher, event_loop) = ui_channel(4);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let worker = {
            let seen = seen.clone();
            std::thread::spawn(move || {
                for i in 0..5 {
                    let seen = seen.clone();
                    dispatcher
                        .invoke_and_wait(move || seen.lock().push(i))
                        .unwrap();
                }
            })
        };

        event_loop.run();
        worker.join().unwrap();
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    }
}
