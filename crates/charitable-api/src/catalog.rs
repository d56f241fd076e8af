use charitable_types::ids::{NonprofitId, PostId};
use charitable_types::models::{Nonprofit, Post};

use crate::client::{Endpoint, HttpApi};
use crate::error::ApiError;

impl HttpApi {
    // -- Nonprofits --

    pub async fn get_nonprofits(&self) -> Result<Vec<Nonprofit>, ApiError> {
        self.client()
            .get(&Endpoint::new(["api", "nonprofits"]))
            .await
    }

    /// A missing slug is [`ApiError::NotFound`], not an HTTP error.
    pub async fn get_nonprofit_by_slug(&self, slug: &str) -> Result<Nonprofit, ApiError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(ApiError::Validation("nonprofit slug is empty".into()));
        }

        self.client()
            .get(&Endpoint::new(["api", "nonprofits", "slug", slug]))
            .await
            .map_err(|e| e.into_not_found(format!("nonprofit '{slug}'")))
    }

    pub async fn get_nonprofit(&self, id: &NonprofitId) -> Result<Nonprofit, ApiError> {
        self.client()
            .get(&Endpoint::new(["api", "nonprofits", id.as_str()]))
            .await
            .map_err(|e| e.into_not_found(format!("nonprofit {id}")))
    }

    // -- Posts --

    pub async fn get_posts_by_nonprofit(&self, id: &NonprofitId) -> Result<Vec<Post>, ApiError> {
        self.client()
            .get(&Endpoint::new(["api", "nonprofits", id.as_str(), "posts"]))
            .await
    }

    pub async fn get_post(&self, id: &PostId) -> Result<Post, ApiError> {
        self.client()
            .get(&Endpoint::new(["api", "posts", id.as_str()]))
            .await
            .map_err(|e| e.into_not_found(format!("post {id}")))
    }
}
