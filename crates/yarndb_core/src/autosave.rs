//! Periodic background saves.

use crate::database::Shared;
use crate::error::CoreResult;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// A thread that saves the store every `interval` until stopped.
///
/// The thread holds only a weak reference, so it never keeps a datastore
/// alive on its own.
#[derive(Debug)]
pub(crate) struct AutoSaver {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl AutoSaver {
    pub fn spawn(shared: Weak<Shared>, interval: Duration) -> CoreResult<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("yarndb-autosave".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let Some(shared) = shared.upgrade() else {
                            break;
                        };
                        if let Err(err) = shared.save() {
                            warn!(error = %err, "periodic save failed");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        debug!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "autosave started"
        );
        Ok(Self { stop, handle })
    }

    /// Stops the thread and waits for an in-flight save to finish.
    pub fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            warn!("autosave thread panicked");
        }
    }
}
