use anyhow::Result;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Builder;

use charitable_types::ids::GuestId;

use crate::store::SecureStore;

/// Storage slot holding the guest identifier.
pub const GUEST_ID_SLOT: &str = "charitable_guest_id";

/// Fresh random v4 UUID from the thread CSPRNG.
pub fn generate_guest_id() -> GuestId {
    let bytes: [u8; 16] = rand::random();
    GuestId::from_uuid(Builder::from_random_bytes(bytes).into_uuid())
}

/// Lazily created, never rotated guest identifier.
///
/// The first `get_or_create` reads the slot and, if it is empty, generates
/// and writes a new id. Concurrent first calls in the same process share
/// one in-flight creation, so only one id is ever generated here. Another
/// process writing the same slot at the same moment is resolved by reading
/// the slot back after the write and adopting whatever won.
pub struct GuestIdentity<S> {
    store: S,
    slot: String,
    cached: OnceCell<GuestId>,
}

impl<S: SecureStore> GuestIdentity<S> {
    pub fn new(store: S) -> Self {
        Self::with_slot(store, GUEST_ID_SLOT)
    }

    pub fn with_slot(store: S, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
            cached: OnceCell::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The id if it has already been resolved in this process.
    pub fn peek(&self) -> Option<GuestId> {
        self.cached.get().copied()
    }

    /// A failed attempt leaves nothing cached; the next call tries again.
    pub async fn get_or_create(&self) -> Result<GuestId> {
        self.cached
            .get_or_try_init(|| self.load_or_create())
            .await
            .copied()
    }

    async fn load_or_create(&self) -> Result<GuestId> {
        if let Some(raw) = self.store.get(&self.slot).await? {
            match GuestId::parse(&raw) {
                Some(id) => {
                    debug!(guest_id = %id, "guest identity loaded");
                    return Ok(id);
                }
                None => warn!(slot = %self.slot, "stored guest id is unreadable; replacing it"),
            }
        }

        let id = generate_guest_id();
        self.store.set(&self.slot, &id.to_string()).await?;

        let stored = self
            .store
            .get(&self.slot)
            .await?
            .as_deref()
            .and_then(GuestId::parse);
        match stored {
            Some(winner) if winner != id => {
                warn!(guest_id = %winner, "another writer created the guest id first; adopting it");
                Ok(winner)
            }
            _ => {
                info!(guest_id = %id, "guest identity created");
                Ok(id)
            }
        }
    }
}
