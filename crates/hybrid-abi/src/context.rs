//! Host execution contexts.
//!
//! Some host runtimes only allow their objects to be touched from one
//! thread. A [`HostContext`] says whether the current thread may call
//! into the host and, if not, accepts jobs to run where it may.
//! [`run_blocking`] is the single entry point the bridge uses: it runs
//! inline when already on the context and otherwise dispatches and waits.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;

use crate::error::ContextError;
use crate::logging::{debug, warn};

/// Work scheduled onto a host context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where host code is allowed to run.
pub trait HostContext: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Whether the calling thread may invoke host code directly.
    fn is_current(&self) -> bool;

    /// Schedule a job to run on the context.
    fn dispatch(&self, job: Job) -> Result<(), ContextError>;
}

/// Run `f` on `context` and wait for its result.
///
/// Panics inside `f` are caught and reported as [`ContextError::Panicked`].
pub fn run_blocking<R, F>(context: &dyn HostContext, f: F) -> Result<R, ContextError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if context.is_current() {
        return catch_unwind(AssertUnwindSafe(f)).map_err(|payload| ContextError::Panicked {
            context: context.name().to_string(),
            message: panic_message(payload.as_ref()),
        });
    }

    let (tx, rx) = channel::bounded(1);
    context.dispatch(Box::new(move || {
        let outcome = catch_unwind(AssertUnwindSafe(f)).map_err(|p| panic_message(p.as_ref()));
        // the waiter may have given up; nothing to report then
        let _ = tx.send(outcome);
    }))?;

    match rx.recv() {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err(ContextError::Panicked {
            context: context.name().to_string(),
            message,
        }),
        Err(_) => Err(ContextError::Unavailable {
            context: context.name().to_string(),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// A context that allows host calls from any thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineContext;

impl HostContext for InlineContext {
    fn name(&self) -> &str {
        "inline"
    }

    fn is_current(&self) -> bool {
        true
    }

    fn dispatch(&self, job: Job) -> Result<(), ContextError> {
        job();
        Ok(())
    }
}

/// A context confined to one dedicated thread.
///
/// Jobs are queued on a channel and run in order. Dropping the context
/// closes the queue and joins the thread once pending jobs have run.
pub struct ConfinedContext {
    name: String,
    thread_id: ThreadId,
    sender: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ConfinedContext {
    pub fn spawn(name: impl Into<String>) -> Result<Arc<Self>, ContextError> {
        let name = name.into();
        let (tx, rx) = channel::unbounded::<Job>();

        let thread_name = name.clone();
        let worker = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                for job in rx.iter() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        warn!(context = %thread_name, "job panicked on confined context");
                    }
                }
                debug!(context = %thread_name, "confined context drained");
            })
            .map_err(|e| ContextError::Spawn {
                context: name.clone(),
                reason: e.to_string(),
            })?;

        debug!(context = %name, "confined context started");
        Ok(Arc::new(Self {
            name,
            thread_id: worker.thread().id(),
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }))
    }

    /// Stop accepting jobs and wait for queued ones to finish.
    ///
    /// Called from the context's own thread it only closes the queue.
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());
        if self.is_current() {
            return;
        }
        let worker = self.worker.lock().take();
        if let Some(worker) = worker
            && worker.join().is_err()
        {
            warn!(context = %self.name, "confined context thread panicked");
        }
    }
}

impl HostContext for ConfinedContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_current(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    fn dispatch(&self, job: Job) -> Result<(), ContextError> {
        let sender = self.sender.lock().clone();
        let unavailable = || ContextError::Unavailable {
            context: self.name.clone(),
        };
        sender.ok_or_else(unavailable)?.send(job).map_err(|_| unavailable())
    }
}

impl Drop for ConfinedContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ConfinedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfinedContext")
            .field("name", &self.name)
            .field("open", &self.sender.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_runs_in_place() {
        let here = std::thread::current().id();
        let ran_on = run_blocking(&InlineContext, move || std::thread::current().id());
        assert_eq!(ran_on, Ok(here));
    }

    #[test]
    fn test_confined_runs_on_its_thread() {
        let ctx = ConfinedContext::spawn("host-main").unwrap();
        let name = run_blocking(ctx.as_ref(), || {
            std::thread::current().name().map(str::to_string)
        });
        assert_eq!(name, Ok(Some("host-main".to_string())));
        assert!(!ctx.is_current());
    }

    #[test]
    fn test_nested_call_runs_inline() {
        let ctx = ConfinedContext::spawn("nested").unwrap();
        let inner = ctx.clone();
        let result = run_blocking(ctx.as_ref(), move || {
            // would deadlock if it queued behind the running job
            run_blocking(inner.as_ref(), || 42)
        });
        assert_eq!(result, Ok(Ok(42)));
    }

    #[test]
    fn test_panic_becomes_error_and_thread_survives() {
        let ctx = ConfinedContext::spawn("panicky").unwrap();
        let err = run_blocking(ctx.as_ref(), || -> i32 { panic!("host exploded") });
        assert!(matches!(err, Err(ContextError::Panicked { ref message, .. }) if message == "host exploded"));
        assert_eq!(run_blocking(ctx.as_ref(), || 1), Ok(1));
    }

    #[test]
    fn test_shutdown_makes_context_unavailable() {
        let ctx = ConfinedContext::spawn("closing").unwrap();
        ctx.shutdown();
        let err = run_blocking(ctx.as_ref(), || 1);
        assert!(matches!(err, Err(ContextError::Unavailable { .. })));
    }
}
