use std::future::Future;

use lakebench_core::prelude::{ShutdownHandle, ShutdownSignalError};

/// Bridges the worker threads onto the shared Tokio runtime.
///
/// Workers are plain OS threads so that the configured concurrency models real concurrent
/// clients, but the cluster client is async. Each worker drives its current call to completion
/// here, racing it against the shutdown signal.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    shutdown_handle: ShutdownHandle,
}

impl Executor {
    pub fn new(runtime: tokio::runtime::Runtime, shutdown_handle: ShutdownHandle) -> Self {
        Self {
            runtime,
            shutdown_handle,
        }
    }

    /// Run async code in place, blocking until it completes.
    ///
    /// The future is cancelled if the sweep is shut down, in which case the error is a
    /// [ShutdownSignalError]. Dropping the future is also what cancels an in-flight query
    /// request, so a timeout or shutdown never leaves a request running.
    pub fn execute_in_place<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        let mut shutdown_listener = self.shutdown_handle.new_listener();
        self.runtime.block_on(async move {
            tokio::select! {
                result = fut => result,
                _ = shutdown_listener.wait_for_shutdown() => {
                    Err(anyhow::anyhow!(ShutdownSignalError::default()))
                },
            }
        })
    }
}
