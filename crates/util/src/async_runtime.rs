//! Bridge between the synchronous execution core and the async transport.

use anyhow::Context;
use std::future::Future;
use tokio::runtime::{Builder, Handle};
use tokio::task;

/// Drives a future to completion from synchronous code.
///
/// Inside a Tokio runtime the future runs on the current handle; elsewhere a
/// throwaway current-thread runtime is built for the one call. The engine
/// invokes this at most once per fetch document, so runtime construction
/// cost is not a concern.
pub fn block_on_future<F, T>(future: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => task::block_in_place(|| handle.block_on(future)),
        Err(_) => Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building blocking runtime")?
            .block_on(future),
    }
}
