//! Background housekeeping for one writer.
//!
//! A single thread per writer runs maintenance passes one at a time, so two
//! passes never race over the same directory listing. Requests coalesce: while
//! a pass is already queued, further requests are dropped, since the queued
//! pass lists the directory fresh and sees every backup renamed before it runs.

use super::ErrorHandler;
use crate::backup::Namer;
use crate::cleanup::{self, RetentionPolicy};
use crate::clock::Clock;
use crate::error::{Error, Op};
use crate::internal;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

enum Request {
    Pass,
    Barrier(Sender<()>),
}

/// Owned copies of everything a pass needs.
pub(super) struct MaintenanceTask {
    pub namer: Namer,
    pub policy: RetentionPolicy,
    pub compress: bool,
    pub clock: Arc<dyn Clock>,
    pub on_error: Option<ErrorHandler>,
}

impl MaintenanceTask {
    fn run(&self) {
        match cleanup::maintain(&self.namer, &self.policy, self.compress, self.clock.now()) {
            Ok(result) => {
                for err in &result.failed {
                    self.report(err);
                }
            }
            Err(e) => self.report(&e),
        }
    }

    fn report(&self, err: &Error) {
        match &self.on_error {
            Some(handler) => handler(err),
            None => internal::error("WORKER", &format!("Maintenance failed: {err}")),
        }
    }
}

pub(super) struct Worker {
    tx: Sender<Request>,
    pending: Arc<AtomicBool>,
}

impl Worker {
    /// Starts the maintenance thread. It exits once the writer (and with it the
    /// sending half) is dropped and the queue is drained.
    pub fn spawn(task: MaintenanceTask, base: &Path) -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel();
        let pending = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&pending);

        thread::Builder::new()
            .name("lumberjack-maintenance".to_string())
            .spawn(move || run(&rx, &task, &flag))
            .map_err(|e| Error::io(Op::Spawn, base, e))?;

        Ok(Self { tx, pending })
    }

    /// Queues a pass unless one is already waiting. Never blocks.
    pub fn request(&self) {
        if self.pending.swap(true, Ordering::AcqRel) {
            internal::trace("WORKER", "Pass already queued, coalescing");
            return;
        }
        if self.tx.send(Request::Pass).is_err() {
            internal::warn("WORKER", "Maintenance worker is gone, skipping pass");
        }
    }

    /// Blocks until every pass requested before this call has finished.
    pub fn barrier(&self) {
        let (done_tx, done_rx) = mpsc::channel();
        if self.tx.send(Request::Barrier(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

fn run(rx: &Receiver<Request>, task: &MaintenanceTask, pending: &AtomicBool) {
    internal::trace("WORKER", "Maintenance worker started");
    while let Ok(request) = rx.recv() {
        match request {
            Request::Pass => {
                // Cleared before the pass so a rotation during it queues another
                pending.store(false, Ordering::Release);
                task.run();
            }
            Request::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    internal::trace("WORKER", "Maintenance worker stopped");
}
