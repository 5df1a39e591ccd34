//! Owner-context rendezvous.
//!
//! All mutations of the graph backend run on a single owner thread. Any other
//! thread hands a closure to [`OwnerHandle::run_on_owner`] and blocks until the
//! owner has run it, which keeps request/response semantics synchronous while
//! guaranteeing that at most one mutation is in flight.
//!
//! The owner side is an [`OwnerPump`]. It is either driven by a dedicated
//! thread ([`OwnerContext::spawn`]) or pumped by a host loop through
//! [`OwnerPump::run_pending`], the way an editor tick would.
//!
//! A panic inside owner work is caught on the owner, so the owner keeps
//! serving, and is re-raised on the thread that submitted the work.

use std::any::Any;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::ActionError;

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Stop,
}

#[derive(Default)]
struct Shared {
    owner_thread: OnceLock<ThreadId>,
    jobs_run: AtomicU64,
}

impl Shared {
    fn on_owner_thread(&self) -> bool {
        self.owner_thread.get() == Some(&thread::current().id())
    }
}

/// Creates a connected handle/pump pair.
pub fn channel() -> (OwnerHandle, OwnerPump) {
    let (tx, rx) = mpsc::channel();
    let shared = Arc::new(Shared::default());
    (
        OwnerHandle {
            tx,
            shared: Arc::clone(&shared),
        },
        OwnerPump { rx, shared },
    )
}

/// Cloneable submitter side of the rendezvous.
#[derive(Clone)]
pub struct OwnerHandle {
    tx: mpsc::Sender<Message>,
    shared: Arc<Shared>,
}

impl OwnerHandle {
    /// Runs `work` on the owner and returns its result.
    ///
    /// Runs inline when already on the owner thread. Otherwise blocks the
    /// calling thread until the owner has run the work. Must not be called
    /// from an async task; use a blocking worker.
    ///
    /// Fails with `OwnerUnavailable` when the owner has stopped or stops
    /// before reaching the work.
    pub fn run_on_owner<T, F>(&self, work: F) -> Result<T, ActionError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.shared.on_owner_thread() {
            let out = work();
            self.shared.jobs_run.fetch_add(1, Ordering::SeqCst);
            return Ok(out);
        }

        let (reply_tx, reply_rx) = oneshot::channel::<Result<T, Box<dyn Any + Send>>>();
        let job: Job = Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(work));
            // The submitter may have gone away; nothing to report then.
            let _ = reply_tx.send(result);
        });
        self.tx
            .send(Message::Run(job))
            .map_err(|_| ActionError::OwnerUnavailable)?;

        match reply_rx.blocking_recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(panic)) => resume_unwind(panic),
            Err(_) => Err(ActionError::OwnerUnavailable),
        }
    }

    /// Whether the calling thread is the owner.
    pub fn is_owner_thread(&self) -> bool {
        self.shared.on_owner_thread()
    }

    /// Number of units of owner work executed so far.
    pub fn jobs_run(&self) -> u64 {
        self.shared.jobs_run.load(Ordering::SeqCst)
    }

    fn request_stop(&self) {
        let _ = self.tx.send(Message::Stop);
    }
}

/// Receiving side of the rendezvous; whoever drives it is the owner.
pub struct OwnerPump {
    rx: mpsc::Receiver<Message>,
    shared: Arc<Shared>,
}

impl OwnerPump {
    fn claim(&self) {
        let me = thread::current().id();
        let owner = *self.shared.owner_thread.get_or_init(|| me);
        if owner != me {
            warn!("owner queue pumped from a thread other than the owner");
        }
    }

    fn execute(&self, job: Job) {
        job();
        self.shared.jobs_run.fetch_add(1, Ordering::SeqCst);
    }

    /// Runs queued work until a stop is requested or every handle is gone.
    pub fn run(self) {
        self.claim();
        debug!("owner loop started");
        while let Ok(message) = self.rx.recv() {
            match message {
                Message::Run(job) => self.execute(job),
                Message::Stop => break,
            }
        }
        debug!("owner loop stopped");
    }

    /// Runs every unit of work queued right now and returns how many ran.
    ///
    /// Stops early at a stop request. Work queued behind it is dropped with
    /// the pump and its callers see `OwnerUnavailable`.
    pub fn run_pending(&self) -> usize {
        self.claim();
        let mut ran = 0;
        while let Ok(message) = self.rx.try_recv() {
            match message {
                Message::Run(job) => {
                    self.execute(job);
                    ran += 1;
                }
                Message::Stop => break,
            }
        }
        ran
    }
}

/// A dedicated owner thread.
pub struct OwnerContext {
    handle: OwnerHandle,
    thread: Option<JoinHandle<()>>,
}

impl OwnerContext {
    /// Starts the owner thread.
    pub fn spawn() -> std::io::Result<Self> {
        let (handle, pump) = channel();
        let thread = thread::Builder::new()
            .name("bpmcp-owner".to_string())
            .spawn(move || pump.run())?;
        Ok(OwnerContext {
            handle,
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> OwnerHandle {
        self.handle.clone()
    }

    /// Stops the owner after the work already queued, then joins it.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.handle.request_stop();
            if thread.join().is_err() {
                warn!("owner thread terminated abnormally");
            }
        }
    }
}

impl Drop for OwnerContext {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
