use tokio::sync::watch;
use tracing::{info, warn};

use charitable_api::donations::{self, DonationApi};
use charitable_api::ApiError;
use charitable_types::api::{CreateDonationRequest, DonorDetails, VerifyDonationResponse};
use charitable_types::events::{CheckoutPhase, ClientEvent, EventBus};
use charitable_types::ids::{NonprofitId, PostId, SessionId};

use crate::browser::{BrowserOutcome, ExternalBrowser};
use crate::error::CheckoutError;

/// Input for one checkout run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationRequest {
    pub nonprofit_id: NonprofitId,
    /// Cents.
    pub amount: u64,
    pub post_id: Option<PostId>,
    pub donor: DonorDetails,
}

impl DonationRequest {
    pub fn new(nonprofit_id: impl Into<NonprofitId>, amount: u64) -> Self {
        Self {
            nonprofit_id: nonprofit_id.into(),
            amount,
            post_id: None,
            donor: DonorDetails::default(),
        }
    }

    pub fn for_post(mut self, post_id: impl Into<PostId>) -> Self {
        self.post_id = Some(post_id.into());
        self
    }

    pub fn with_donor(mut self, donor: DonorDetails) -> Self {
        self.donor = donor;
        self
    }

    fn to_wire(&self) -> CreateDonationRequest {
        CreateDonationRequest {
            nonprofit_id: self.nonprofit_id.clone(),
            amount: self.amount,
            post_id: self.post_id.clone(),
            donor: self.donor.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutState {
    pub phase: CheckoutPhase,
    /// Set from the moment a session exists until the flow is restarted.
    pub session_id: Option<SessionId>,
}

impl CheckoutState {
    fn idle() -> Self {
        Self {
            phase: CheckoutPhase::Idle,
            session_id: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            CheckoutPhase::CreatingSession | CheckoutPhase::AwaitingExternalCompletion
        )
    }
}

/// How a run ended from this flow's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The browser came back through the success redirect. Payment may or may
    /// not have cleared; use [`DonationCheckoutFlow::verify`] to find out.
    Returned { session_id: SessionId },
    /// Cancelled or dismissed. No donation is assumed.
    Cancelled { session_id: SessionId },
}

impl CheckoutOutcome {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Returned { session_id } | Self::Cancelled { session_id } => session_id,
        }
    }

    pub fn phase(&self) -> CheckoutPhase {
        match self {
            Self::Returned { .. } => CheckoutPhase::SettledUnknown,
            Self::Cancelled { .. } => CheckoutPhase::Cancelled,
        }
    }
}

/// `idle -> creating-session -> awaiting-external-completion -> settled-unknown | cancelled`
///
/// One [`start`](Self::start) creates exactly one session. Runs on the same
/// flow are serialized: a second `start` while one is active fails with
/// [`CheckoutError::Busy`]. Starting again after a terminal phase always asks
/// for a new session.
pub struct DonationCheckoutFlow<A, B> {
    api: A,
    browser: B,
    state: watch::Sender<CheckoutState>,
    events: EventBus,
}

impl<A: DonationApi, B: ExternalBrowser> DonationCheckoutFlow<A, B> {
    pub fn new(api: A, browser: B, events: EventBus) -> Self {
        let (state, _) = watch::channel(CheckoutState::idle());
        Self {
            api,
            browser,
            state,
            events,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state.subscribe()
    }

    pub async fn start(&self, req: &DonationRequest) -> Result<CheckoutOutcome, CheckoutError> {
        let wire = req.to_wire();
        donations::validate(&wire).map_err(validation)?;

        let mut run = self.claim()?;

        info!(
            nonprofit_id = %wire.nonprofit_id,
            amount = wire.amount,
            "creating checkout session"
        );
        let session = match self.api.create_donation(&wire).await {
            Ok(session) => session,
            Err(ApiError::Validation(msg)) => return Err(CheckoutError::Validation(msg)),
            Err(e) => {
                warn!("checkout session creation failed: {}", e);
                return Err(CheckoutError::SessionCreation(e));
            }
        };

        run.advance(
            CheckoutPhase::AwaitingExternalCompletion,
            Some(session.session_id.clone()),
        );

        let outcome = self
            .browser
            .open(&session.checkout_url)
            .await
            .map_err(CheckoutError::Browser)?;

        let outcome = match outcome {
            BrowserOutcome::Completed => CheckoutOutcome::Returned {
                session_id: session.session_id,
            },
            BrowserOutcome::Cancelled | BrowserOutcome::Dismissed => {
                info!(session_id = %session.session_id, ?outcome, "checkout abandoned");
                CheckoutOutcome::Cancelled {
                    session_id: session.session_id,
                }
            }
        };

        run.finish(outcome.phase(), Some(outcome.session_id().clone()));
        Ok(outcome)
    }

    /// Ask the backend whether the payment behind a session cleared. Never
    /// called by [`start`](Self::start).
    pub async fn verify(&self, session_id: &SessionId) -> Result<VerifyDonationResponse, ApiError> {
        let resp = self.api.verify_donation(session_id).await?;
        info!(
            session_id = %session_id,
            success = resp.success,
            status = ?resp.donation.as_ref().map(|d| d.status),
            "donation verified"
        );
        Ok(resp)
    }

    /// Return a finished flow to idle. No-op while a run is active.
    pub fn reset(&self) {
        let changed = self.state.send_if_modified(|state| {
            if state.is_busy() || state.phase == CheckoutPhase::Idle {
                return false;
            }
            *state = CheckoutState::idle();
            true
        });
        if changed {
            self.announce();
        }
    }

    fn claim(&self) -> Result<Run<'_, A, B>, CheckoutError> {
        let claimed = self.state.send_if_modified(|state| {
            if state.is_busy() {
                return false;
            }
            *state = CheckoutState {
                phase: CheckoutPhase::CreatingSession,
                session_id: None,
            };
            true
        });
        if !claimed {
            return Err(CheckoutError::Busy);
        }
        self.announce();
        Ok(Run {
            flow: self,
            finished: false,
        })
    }

    fn transition(&self, phase: CheckoutPhase, session_id: Option<SessionId>) {
        self.state.send_replace(CheckoutState { phase, session_id });
        self.announce();
    }

    fn announce(&self) {
        let state = self.state();
        info!(phase = ?state.phase, session_id = ?state.session_id, "checkout state changed");
        self.events.publish(ClientEvent::CheckoutStateChanged {
            phase: state.phase,
            session_id: state.session_id,
        });
    }
}

fn validation(e: ApiError) -> CheckoutError {
    match e {
        ApiError::Validation(msg) => CheckoutError::Validation(msg),
        other => CheckoutError::Validation(other.to_string()),
    }
}

/// An active run. Dropping it before `finish` puts the flow back to idle, so
/// an error or an abandoned `start` future never leaves it stuck busy.
struct Run<'a, A: DonationApi, B: ExternalBrowser> {
    flow: &'a DonationCheckoutFlow<A, B>,
    finished: bool,
}

impl<A: DonationApi, B: ExternalBrowser> Run<'_, A, B> {
    fn advance(&mut self, phase: CheckoutPhase, session_id: Option<SessionId>) {
        self.flow.transition(phase, session_id);
    }

    fn finish(mut self, phase: CheckoutPhase, session_id: Option<SessionId>) {
        self.finished = true;
        self.flow.transition(phase, session_id);
    }
}

impl<A: DonationApi, B: ExternalBrowser> Drop for Run<'_, A, B> {
    fn drop(&mut self) {
        if !self.finished {
            self.flow.transition(CheckoutPhase::Idle, None);
        }
    }
}
