// Path: crates/store/src/task.rs

//! Cooperative background threads.
//!
//! Work runs on a named OS thread and polls a [`CancelToken`] at its own
//! checkpoints. Any number of callers may wait on the same task: the first
//! one joins the thread and receives its result, later ones receive a
//! reconstruction of it.

use lexdb_types::LexError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns [`LexError::Interrupted`] if cancellation was requested.
    pub fn checkpoint(&self) -> Result<(), LexError> {
        if self.is_cancelled() {
            Err(LexError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Completed,
    Interrupted,
    Failed(String),
}

impl Outcome {
    fn of(result: &Result<(), LexError>) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(LexError::Interrupted) => Self::Interrupted,
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    fn into_result(self) -> Result<(), LexError> {
        match self {
            Self::Completed => Ok(()),
            Self::Interrupted => Err(LexError::Interrupted),
            Self::Failed(msg) => Err(LexError::Background(msg)),
        }
    }
}

/// A running or finished background thread.
#[derive(Debug)]
pub(crate) struct BackgroundTask {
    name: String,
    token: CancelToken,
    handle: Mutex<Option<JoinHandle<Result<(), LexError>>>>,
    outcome: Mutex<Option<Outcome>>,
}

impl BackgroundTask {
    /// Spawns `work` on a new thread named `name`.
    pub(crate) fn spawn<F>(name: &str, work: F) -> Result<Arc<Self>, LexError>
    where
        F: FnOnce(CancelToken) -> Result<(), LexError> + Send + 'static,
    {
        let token = CancelToken::new();
        let worker_token = token.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || work(worker_token))?;
        Ok(Arc::new(Self {
            name: name.to_string(),
            token,
            handle: Mutex::new(Some(handle)),
            outcome: Mutex::new(None),
        }))
    }

    /// Whether the thread has exited.
    pub(crate) fn is_finished(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }

    /// Requests cancellation.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Blocks until the thread exits and returns its result.
    pub(crate) fn wait(&self) -> Result<(), LexError> {
        let mut handle = self.handle.lock();
        if let Some(h) = handle.take() {
            let result = h
                .join()
                .map_err(|_| LexError::Background(format!("{} panicked", self.name)))
                .and_then(|r| r);
            *self.outcome.lock() = Some(Outcome::of(&result));
            return result;
        }
        drop(handle);
        self.outcome
            .lock()
            .clone()
            .map_or(Ok(()), Outcome::into_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn returns_the_work_result_to_every_waiter() {
        let task = BackgroundTask::spawn("test-ok", |_| Ok(())).unwrap();
        task.wait().unwrap();
        task.wait().unwrap();
        assert!(task.is_finished());

        let failing = BackgroundTask::spawn("test-fail", |_| {
            Err(LexError::misformatted("x", "bad"))
        })
        .unwrap();
        assert!(matches!(failing.wait(), Err(LexError::MisformattedLine { .. })));
        assert!(matches!(failing.wait(), Err(LexError::Background(_))));
    }

    #[test]
    fn cancellation_is_observed_at_checkpoints() {
        let task = BackgroundTask::spawn("test-cancel", |token| loop {
            token.checkpoint()?;
            std::thread::sleep(Duration::from_millis(1));
        })
        .unwrap();
        task.cancel();
        assert!(matches!(task.wait(), Err(LexError::Interrupted)));
        assert!(matches!(task.wait(), Err(LexError::Interrupted)));
    }

    #[test]
    fn panics_become_background_errors() {
        let task = BackgroundTask::spawn("test-panic", |_| panic!("boom")).unwrap();
        assert!(matches!(task.wait(), Err(LexError::Background(_))));
    }
}
