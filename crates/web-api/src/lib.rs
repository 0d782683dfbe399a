//! REST API for the tier rewards platform.
//!
//! Exposes conversion rate management, network reward CRUD, tier pricing,
//! per-user level graph distribution, and the animation completion
//! transition. All endpoints return `{ success, data | message }` JSON
//! envelopes.

pub mod animation;
pub mod handlers;
pub mod server;
pub mod state;

pub use animation::{AnimationCompletionHandler, CompletionError};
pub use server::ApiServer;
pub use state::AppState;
