use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DonationId, GuestId, NonprofitId, PostId, SessionId};

// -- Nonprofits --

/// The fixed category set. Anything the client does not recognise lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NonprofitCategory {
    Education,
    Health,
    Environment,
    Animals,
    #[serde(rename = "Arts & Culture")]
    ArtsAndCulture,
    #[serde(rename = "Community Development")]
    CommunityDevelopment,
    #[serde(rename = "Human Services")]
    HumanServices,
    International,
    Religion,
    #[serde(other)]
    Other,
}

impl NonprofitCategory {
    pub const ALL: [NonprofitCategory; 10] = [
        Self::Education,
        Self::Health,
        Self::Environment,
        Self::Animals,
        Self::ArtsAndCulture,
        Self::CommunityDevelopment,
        Self::HumanServices,
        Self::International,
        Self::Religion,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Education => "Education",
            Self::Health => "Health",
            Self::Environment => "Environment",
            Self::Animals => "Animals",
            Self::ArtsAndCulture => "Arts & Culture",
            Self::CommunityDevelopment => "Community Development",
            Self::HumanServices => "Human Services",
            Self::International => "International",
            Self::Religion => "Religion",
            Self::Other => "Other",
        }
    }
}

/// Totals are maintained by the server. The client never writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nonprofit {
    pub id: NonprofitId,
    pub name: String,
    pub slug: String,
    pub mission: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: NonprofitCategory,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub total_raised: Option<u64>,
    #[serde(default)]
    pub donor_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Nonprofit {
    pub fn verified(&self) -> bool {
        self.is_verified.unwrap_or(false)
    }

    pub fn total_raised_cents(&self) -> u64 {
        self.total_raised.unwrap_or(0)
    }
}

/// Abbreviated nonprofit embedded in feed items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonprofitSummary {
    pub id: NonprofitId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    pub category: NonprofitCategory,
}

// -- Posts --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub nonprofit_id: NonprofitId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub goal_amount: Option<u64>,
    #[serde(default)]
    pub raised_amount: Option<u64>,
    #[serde(default)]
    pub donor_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default, alias = "isActive")]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Share of the goal raised so far, clamped to 0..=100.
    ///
    /// `raised_amount` may exceed the goal; only the ratio is clamped.
    pub fn progress_percent(&self) -> Option<f64> {
        let goal = self.goal_amount.filter(|g| *g > 0)?;
        let raised = self.raised_amount.unwrap_or(0) as f64;
        Some((raised / goal as f64 * 100.0).clamp(0.0, 100.0))
    }

    pub fn likes(&self) -> u64 {
        self.like_count.unwrap_or(0)
    }
}

/// Feed projection: a post plus the owning nonprofit's summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithNonprofit {
    #[serde(flatten)]
    pub post: Post,
    pub nonprofit: NonprofitSummary,
    /// Filled in when the feed was requested with a guest id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_reacted: Option<bool>,
}

// -- Reactions --

/// Who a reaction is attributed to. Exactly one side is ever set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attributor {
    Supporter(String),
    Guest(GuestId),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "ReactionWire")]
pub struct Reaction {
    pub id: String,
    pub post_id: PostId,
    pub attributor: Attributor,
    pub kind: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReactionWire {
    id: String,
    post_id: PostId,
    #[serde(default)]
    supporter_id: Option<String>,
    #[serde(default)]
    guest_id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReactionWire> for Reaction {
    type Error = String;

    fn try_from(wire: ReactionWire) -> Result<Self, Self::Error> {
        let attributor = match (wire.supporter_id, wire.guest_id) {
            (Some(supporter), None) => Attributor::Supporter(supporter),
            (None, Some(guest)) => Attributor::Guest(
                GuestId::parse(&guest).ok_or_else(|| format!("invalid guest id: {guest}"))?,
            ),
            (Some(_), Some(_)) => {
                return Err("reaction has both supporterId and guestId".into());
            }
            (None, None) => return Err("reaction has no attributor".into()),
        };

        Ok(Self {
            id: wire.id,
            post_id: wire.post_id,
            attributor,
            kind: wire.kind.unwrap_or_else(|| "like".into()),
            created_at: wire.created_at,
        })
    }
}

// -- Donations --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Created,
    Pending,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl DonationStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Server record of a donation. The client reads it after verification and
/// never changes its status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: DonationId,
    pub nonprofit_id: NonprofitId,
    #[serde(default)]
    pub post_id: Option<PostId>,
    pub amount: u64,
    #[serde(default)]
    pub donor_email: Option<String>,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_anonymous: Option<bool>,
    pub status: DonationStatus,
    #[serde(default, rename = "stripeCheckoutSessionId")]
    pub checkout_session_id: Option<SessionId>,
    #[serde(default, rename = "stripePaymentIntentId")]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_json() -> serde_json::Value {
        json!({
            "id": "p1",
            "nonprofitId": 7,
            "title": "Clean water",
            "content": "Wells for the valley",
            "imageUrl": null,
            "goalAmount": 100000,
            "raisedAmount": 25000,
            "likeCount": 3,
            "isPublished": true,
            "createdAt": "2025-03-01T12:00:00Z"
        })
    }

    #[test]
    fn decodes_feed_item_with_flattened_post() {
        let mut value = post_json();
        value["nonprofit"] = json!({
            "id": "7",
            "name": "Red Cross",
            "slug": "red-cross",
            "logoUrl": null,
            "category": "Human Services"
        });

        let item: PostWithNonprofit = serde_json::from_value(value).unwrap();
        assert_eq!(item.post.id.as_str(), "p1");
        assert_eq!(item.post.nonprofit_id.as_str(), "7");
        assert_eq!(item.nonprofit.category, NonprofitCategory::HumanServices);
        assert_eq!(item.post.likes(), 3);
        assert!(item.has_reacted.is_none());
    }

    #[test]
    fn progress_is_clamped_but_raised_is_not() {
        let mut post: Post = serde_json::from_value(post_json()).unwrap();
        assert_eq!(post.progress_percent(), Some(25.0));

        post.raised_amount = Some(250_000);
        assert_eq!(post.progress_percent(), Some(100.0));
        assert_eq!(post.raised_amount, Some(250_000));

        post.goal_amount = None;
        assert_eq!(post.progress_percent(), None);
    }

    #[test]
    fn unknown_category_falls_back_to_other() {
        let cat: NonprofitCategory = serde_json::from_str("\"Space Exploration\"").unwrap();
        assert_eq!(cat, NonprofitCategory::Other);
        let cat: NonprofitCategory = serde_json::from_str("\"Arts & Culture\"").unwrap();
        assert_eq!(cat.label(), "Arts & Culture");
    }

    #[test]
    fn reaction_requires_exactly_one_attributor() {
        let guest = json!({
            "id": "r1",
            "postId": "p1",
            "supporterId": null,
            "guestId": "6f1c1c9e-6a47-4d55-9a0a-5b7b0d0b8f10",
            "type": "like"
        });
        let reaction: Reaction = serde_json::from_value(guest).unwrap();
        assert!(matches!(reaction.attributor, Attributor::Guest(_)));

        let both = json!({
            "id": "r2",
            "postId": "p1",
            "supporterId": "s1",
            "guestId": "6f1c1c9e-6a47-4d55-9a0a-5b7b0d0b8f10"
        });
        assert!(serde_json::from_value::<Reaction>(both).is_err());

        let neither = json!({ "id": "r3", "postId": "p1" });
        assert!(serde_json::from_value::<Reaction>(neither).is_err());
    }

    #[test]
    fn donation_status_tolerates_new_states() {
        let status: DonationStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, DonationStatus::Unknown);
        assert!(DonationStatus::Completed.is_settled());
        assert!(!DonationStatus::Pending.is_terminal());
    }
}
