//! Service Layer
//!
//! The service layer talks to the outside world: the ladder REST endpoints
//! and the real-time push channels. It runs fetches on tokio and hands typed
//! results to the state layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Service Layer                           │
//! │  ┌──────────────┐  ┌───────────────┐  ┌─────────────────┐   │
//! │  │ HttpLadderApi│  │    PushHub    │  │     runtime     │   │
//! │  │  (REST)      │  │ (ladder-<id>) │  │ (task spawning) │   │
//! │  └──────────────┘  └───────────────┘  └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!            │ LadderApi / PageSource     │ PushEvent
//!            ▼                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      State Layer                             │
//! │            (RowCache, LadderView, VirtualList)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod api;
mod events;
mod http;
mod push;
pub mod runtime;

pub use api::*;
pub use events::*;
pub use http::*;
pub use push::*;
