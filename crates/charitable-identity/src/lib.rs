//! Durable anonymous identity.
//!
//! A guest id is created the first time anything asks for one, written to a
//! single secure-storage slot, and read back from there for the life of the
//! installation. It is never rotated and never leaves the device except as
//! the attribution on reactions.

pub mod guest;
pub mod sqlite;
pub mod store;

pub use guest::{GUEST_ID_SLOT, GuestIdentity, generate_guest_id};
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, SecureStore};
