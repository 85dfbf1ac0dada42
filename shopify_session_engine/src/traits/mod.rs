//! Interface contracts for session-store backends.
//!
//! Backends implement [`SessionManagement`] to act as the durable session store for the gateway. The
//! contract every implementation must honour:
//!
//! * Rotation (deactivate-then-upsert) is a single atomic transaction. A failed rotation rolls back
//!   wholly and never leaves a shop deactivated without a replacement.
//! * Concurrent rotations for the same shop serialize; at most one row is active per shop afterwards.
//! * Rows are deactivated, never hard-deleted.
mod session_management;

pub use session_management::{SessionManagement, SessionStoreError};
