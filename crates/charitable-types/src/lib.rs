//! Shared data model for the Charitable client.
//!
//! Everything here is a read view of server state or a wire shape for the
//! REST surface. The only client-owned value is the guest identifier, which
//! lives in `charitable-identity`.

pub mod api;
pub mod events;
pub mod ids;
pub mod models;
pub mod money;
