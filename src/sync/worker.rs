//! Background fetching of deck payloads
//!
//! Fetching and parsing may happen on a worker thread, but the result is
//! handed back to the thread that owns the store, which runs the import.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError<E> {
    #[error("fetch failed: {0}")]
    Failed(E),

    #[error("fetch worker stopped without a result")]
    Disconnected,
}

/// Handle to a payload being fetched on a worker thread
pub struct PendingFetch<T, E> {
    receiver: Receiver<Result<T, E>>,
    handle: Option<JoinHandle<()>>,
}

/// Run `loader` on a new thread
pub fn spawn_fetch<T, E, F>(loader: F) -> PendingFetch<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let handle = thread::spawn(move || {
        // The receiver may be gone if the caller gave up waiting
        let _ = sender.send(loader());
    });

    PendingFetch {
        receiver,
        handle: Some(handle),
    }
}

impl<T, E> PendingFetch<T, E> {
    /// Block until the worker delivers its result
    pub fn wait(mut self) -> Result<T, FetchError<E>> {
        let result = self.receiver.recv().map_err(|_| FetchError::Disconnected);
        self.join();
        result?.map_err(FetchError::Failed)
    }

    /// Poll without blocking, for callers driving their own event loop
    pub fn try_take(&mut self) -> Option<Result<T, FetchError<E>>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result.map_err(FetchError::Failed))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(FetchError::Disconnected))
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Fetch worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_wait_returns_loader_result() {
        let pending = spawn_fetch(|| Ok::<_, String>(42));
        assert_eq!(pending.wait().unwrap(), 42);
    }

    #[test]
    fn test_wait_reports_loader_error() {
        let pending = spawn_fetch(|| Err::<u32, _>("offline".to_string()));
        assert!(matches!(pending.wait(), Err(FetchError::Failed(e)) if e == "offline"));
    }

    #[test]
    fn test_panicking_loader_disconnects() {
        let pending = spawn_fetch(|| -> Result<u32, String> { panic!("boom") });
        assert!(matches!(pending.wait(), Err(FetchError::Disconnected)));
    }

    #[test]
    fn test_try_take_polls_until_ready() {
        let mut pending = spawn_fetch(|| {
            thread::sleep(Duration::from_millis(20));
            Ok::<_, String>("payload")
        });

        let result = loop {
            if let Some(result) = pending.try_take() {
                break result;
            }
            thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(result.unwrap(), "payload");
    }
}
