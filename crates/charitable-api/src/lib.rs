//! Typed access to the Charitable REST surface.
//!
//! [`RequestClient`] does one HTTP round trip per call and nothing else.
//! [`HttpApi`] layers the endpoint methods on top of it, grouped by concern:
//! feed paging, catalog reads, reactions and donations. Components that need
//! to be exercised without a network depend on the [`FeedSource`],
//! [`ReactionApi`] and [`DonationApi`] traits instead of `HttpApi` itself.

pub mod catalog;
pub mod client;
pub mod config;
pub mod donations;
pub mod error;
pub mod feed;
pub mod reactions;

pub use client::{Endpoint, HttpApi, RequestClient};
pub use config::ClientConfig;
pub use donations::DonationApi;
pub use error::ApiError;
pub use feed::{FeedPager, FeedSource};
pub use reactions::ReactionApi;
