//! Donation checkout handoff.
//!
//! A [`DonationCheckoutFlow`] asks the backend for a hosted checkout session,
//! hands its URL to an [`ExternalBrowser`], and turns whatever the browser
//! reports back into a terminal phase. It never decides on its own whether
//! money moved; callers that need to know ask [`DonationCheckoutFlow::verify`].

pub mod browser;
pub mod error;
pub mod flow;

pub use browser::{BrowserOutcome, ExternalBrowser};
pub use error::CheckoutError;
pub use flow::{CheckoutOutcome, CheckoutState, DonationCheckoutFlow, DonationRequest};
