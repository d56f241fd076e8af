use std::future::Future;

use charitable_types::api::{
    CreateDonationRequest, DonationCheckoutResponse, VerifyDonationResponse,
};
use charitable_types::ids::SessionId;
use charitable_types::money::{MIN_DONATION_CENTS, format_cents};

use crate::client::{Endpoint, HttpApi};
use crate::error::ApiError;

/// Checkout session endpoints.
pub trait DonationApi: Send + Sync + 'static {
    /// Ask the backend for a hosted checkout session.
    fn create_donation(
        &self,
        req: &CreateDonationRequest,
    ) -> impl Future<Output = Result<DonationCheckoutResponse, ApiError>> + Send;

    /// Look up whether the payment behind a session actually cleared.
    fn verify_donation(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<VerifyDonationResponse, ApiError>> + Send;
}

/// Client-side checks run before a session is requested.
pub fn validate(req: &CreateDonationRequest) -> Result<(), ApiError> {
    if req.amount < MIN_DONATION_CENTS {
        return Err(ApiError::Validation(format!(
            "minimum donation is {}, got {}",
            format_cents(MIN_DONATION_CENTS),
            format_cents(req.amount)
        )));
    }

    if req.nonprofit_id.as_str().trim().is_empty() {
        return Err(ApiError::Validation("nonprofit id is empty".into()));
    }

    if let Some(email) = req.donor.donor_email.as_deref() {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(ApiError::Validation(format!("invalid donor email: {email}")));
        }
    }

    Ok(())
}

impl DonationApi for HttpApi {
    async fn create_donation(
        &self,
        req: &CreateDonationRequest,
    ) -> Result<DonationCheckoutResponse, ApiError> {
        validate(req)?;
        self.client()
            .post(&Endpoint::new(["api", "donations"]), req)
            .await
    }

    async fn verify_donation(
        &self,
        session_id: &SessionId,
    ) -> Result<VerifyDonationResponse, ApiError> {
        self.client()
            .get(&Endpoint::new(["api", "donations", "verify", session_id.as_str()]))
            .await
    }
}
