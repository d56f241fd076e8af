use serde::{Deserialize, Serialize};

use crate::ids::{Cursor, GuestId, NonprofitId, PostId, SessionId};
use crate::models::{Donation, PostWithNonprofit};

// -- Feed --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub posts: Vec<PostWithNonprofit>,
    /// Absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
}

// -- Reactions --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionRequest {
    pub guest_id: GuestId,
}

/// Server verdict after a toggle. `count` is authoritative when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub liked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikedResponse {
    pub liked: bool,
}

// -- Donations --

/// Optional contact details attached to a donation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    pub nonprofit_id: NonprofitId,
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
    #[serde(flatten)]
    pub donor: DonorDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationCheckoutResponse {
    pub checkout_url: String,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyDonationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation: Option<Donation>,
}

// -- Errors --

/// Error payload some endpoints return alongside a non-2xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_donation_omits_absent_fields() {
        let req = CreateDonationRequest {
            nonprofit_id: "np1".into(),
            amount: 2500,
            post_id: None,
            donor: DonorDetails::default(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "nonprofitId": "np1", "amount": 2500 })
        );

        let req = CreateDonationRequest {
            post_id: Some("p9".into()),
            donor: DonorDetails {
                donor_name: Some("Ada".into()),
                is_anonymous: Some(true),
                ..DonorDetails::default()
            },
            ..req
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "nonprofitId": "np1",
                "amount": 2500,
                "postId": "p9",
                "donorName": "Ada",
                "isAnonymous": true
            })
        );
    }

    #[test]
    fn error_body_prefers_message_then_error() {
        let body: ErrorBody = serde_json::from_value(json!({ "error": "nope" })).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("nope"));

        let body: ErrorBody =
            serde_json::from_value(json!({ "message": "bad slug", "error": "x" })).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("bad slug"));

        assert_eq!(ErrorBody::default().into_message(), None);
    }

    #[test]
    fn reaction_count_is_optional() {
        let resp: ReactionResponse = serde_json::from_value(json!({ "liked": true })).unwrap();
        assert_eq!(resp, ReactionResponse { liked: true, count: None });
    }
}
