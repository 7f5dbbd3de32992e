use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use thiserror::Error;

use super::PersistenceError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Pipeline is shut down")]
    ShutDown,
    #[error("Timed out after {0:?} waiting for pending writes")]
    Timeout(Duration),
    #[error("Flush requested from the pipeline worker itself")]
    Reentrant,
}

pub type Job = Box<dyn FnOnce() -> Result<(), PersistenceError> + Send + 'static>;

enum Task {
    Job { name: &'static str, run: Job },
    Barrier(Sender<()>),
}

/// Strictly ordered queue drained by one dedicated worker thread.
///
/// A failing or panicking job is logged and dropped; the worker moves on to
/// the next task.
pub struct WritePipeline {
    label: String,
    sender: Mutex<Option<Sender<Task>>>,
    pending: Arc<AtomicUsize>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl WritePipeline {
    pub fn spawn(label: impl Into<String>) -> std::io::Result<Self> {
        let label = label.into();
        let (sender, receiver) = unbounded();
        let pending = Arc::new(AtomicUsize::new(0));

        let handle = thread::Builder::new()
            .name(format!("uhd-writer-{label}"))
            .spawn({
                let label = label.clone();
                let pending = Arc::clone(&pending);
                move || run_worker(&label, receiver, &pending)
            })?;
        let worker_id = handle.thread().id();

        Ok(Self {
            label,
            sender: Mutex::new(Some(sender)),
            pending,
            worker: Mutex::new(Some(handle)),
            worker_id,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Jobs enqueued but not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Append a job. Returns as soon as it is queued.
    pub fn enqueue(&self, name: &'static str, run: Job) -> Result<(), PipelineError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = guard.as_ref().ok_or(PipelineError::ShutDown)?;
        self.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(Task::Job { name, run }).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(PipelineError::ShutDown);
        }
        Ok(())
    }

    /// Block until every task enqueued before this call has finished.
    pub fn flush_and_wait(&self, timeout: Duration) -> Result<(), PipelineError> {
        let done = self.enqueue_barrier()?;
        match done.recv_timeout(timeout) {
            Ok(()) => Ok(()),
            Err(RecvTimeoutError::Timeout) => Err(PipelineError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(PipelineError::ShutDown),
        }
    }

    /// Like [`flush_and_wait`](Self::flush_and_wait) without a deadline.
    pub fn wait_idle(&self) -> Result<(), PipelineError> {
        let done = self.enqueue_barrier()?;
        done.recv().map_err(|_| PipelineError::ShutDown)
    }

    fn enqueue_barrier(&self) -> Result<Receiver<()>, PipelineError> {
        if thread::current().id() == self.worker_id {
            return Err(PipelineError::Reentrant);
        }
        let (tx, rx) = bounded(1);
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = guard.as_ref().ok_or(PipelineError::ShutDown)?;
        sender
            .send(Task::Barrier(tx))
            .map_err(|_| PipelineError::ShutDown)?;
        Ok(rx)
    }

    /// Stop accepting tasks, drain what is queued, and join the worker.
    pub fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        if thread::current().id() == self.worker_id {
            return;
        }
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!(pipeline = %self.label, "writer thread panicked");
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Drop for WritePipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(label: &str, receiver: Receiver<Task>, pending: &AtomicUsize) {
    for task in receiver.iter() {
        match task {
            Task::Job { name, run } => {
                match catch_unwind(AssertUnwindSafe(run)) {
                    Ok(Ok(())) => {
                        tracing::trace!(pipeline = %label, task = name, "task finished");
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(
                            pipeline = %label,
                            task = name,
                            error = %e,
                            "task failed, dropped"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(pipeline = %label, task = name, "task panicked, dropped");
                    }
                }
                pending.fetch_sub(1, Ordering::SeqCst);
            }
            Task::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!(pipeline = %label, "writer drained and stopped");
}
