use std::future::Future;

use charitable_types::api::{LikedResponse, ReactionResponse, ToggleReactionRequest};
use charitable_types::ids::{GuestId, PostId};

use crate::client::{Endpoint, HttpApi};
use crate::error::ApiError;

/// Like-reaction endpoints, attributed to a guest.
pub trait ReactionApi: Send + Sync + 'static {
    /// Whether `guest_id` currently likes the post.
    fn check_reaction(
        &self,
        post_id: &PostId,
        guest_id: GuestId,
    ) -> impl Future<Output = Result<LikedResponse, ApiError>> + Send;

    /// Flip the like. The server decides the resulting state.
    fn toggle_reaction(
        &self,
        post_id: &PostId,
        guest_id: GuestId,
    ) -> impl Future<Output = Result<ReactionResponse, ApiError>> + Send;
}

impl ReactionApi for HttpApi {
    async fn check_reaction(
        &self,
        post_id: &PostId,
        guest_id: GuestId,
    ) -> Result<LikedResponse, ApiError> {
        let endpoint =
            Endpoint::new(["api", "posts", post_id.as_str(), "liked"]).query("guestId", guest_id);
        self.client().get(&endpoint).await
    }

    async fn toggle_reaction(
        &self,
        post_id: &PostId,
        guest_id: GuestId,
    ) -> Result<ReactionResponse, ApiError> {
        let endpoint = Endpoint::new(["api", "posts", post_id.as_str(), "react"]);
        self.client()
            .post(&endpoint, &ToggleReactionRequest { guest_id })
            .await
    }
}
