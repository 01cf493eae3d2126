//! Tokio Runtime Bridge
//!
//! Page fetches run as detached tokio tasks so they keep going after every
//! caller has stopped polling. Callers that already live inside a tokio
//! runtime spawn onto it; callers driven by another executor (a UI event
//! loop, a plain thread) fall back to a lazily created shared runtime.
//!
//! ## Pattern
//!
//! ```text
//! RowCache::fetch(index)
//!       │
//!       ▼
//! spawn(fetch_page(...))
//!       │
//!       ├── inside tokio ──► Handle::current().spawn()
//!       └── elsewhere ─────► shared Runtime::spawn()
//! ```

use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

/// Fallback tokio runtime instance
static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the fallback tokio runtime
fn get_runtime() -> &'static Runtime {
    TOKIO_RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create tokio runtime"))
}

/// Get a handle to the runtime tasks should be spawned on
pub fn runtime_handle() -> Handle {
    Handle::try_current().unwrap_or_else(|_| get_runtime().handle().clone())
}

/// Spawn a task on the current runtime, or on the fallback runtime
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    runtime_handle().spawn(future)
}
