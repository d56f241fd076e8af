//! Checkout sequencing against fake donation endpoints and a scripted browser.
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use charitable_api::{ApiError, DonationApi};
use charitable_checkout::{
    BrowserOutcome, CheckoutError, CheckoutOutcome, DonationCheckoutFlow, DonationRequest,
    ExternalBrowser,
};
use charitable_types::api::{
    CreateDonationRequest, DonationCheckoutResponse, VerifyDonationResponse,
};
use charitable_types::events::{CheckoutPhase, ClientEvent, EventBus};
use charitable_types::ids::SessionId;

#[derive(Default)]
struct Donations {
    created: AtomicUsize,
    verified: AtomicUsize,
    fail: AtomicBool,
    last: Mutex<Option<CreateDonationRequest>>,
}

#[derive(Clone)]
struct FakeApi(Arc<Donations>);

impl DonationApi for FakeApi {
    async fn create_donation(
        &self,
        req: &CreateDonationRequest,
    ) -> Result<DonationCheckoutResponse, ApiError> {
        if self.0.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Http {
                status: 503,
                message: "payments offline".into(),
            });
        }
        let n = self.0.created.fetch_add(1, Ordering::SeqCst) + 1;
        *self.0.last.lock() = Some(req.clone());
        Ok(DonationCheckoutResponse {
            checkout_url: format!("https://checkout.test/cs_{n}"),
            session_id: SessionId::new(format!("cs_{n}")),
        })
    }

    async fn verify_donation(
        &self,
        _session_id: &SessionId,
    ) -> Result<VerifyDonationResponse, ApiError> {
        self.0.verified.fetch_add(1, Ordering::SeqCst);
        Ok(VerifyDonationResponse {
            success: true,
            donation: None,
        })
    }
}

struct Browser {
    script: Mutex<VecDeque<Result<BrowserOutcome, String>>>,
    opened: Mutex<Vec<String>>,
    gate: Semaphore,
}

impl Browser {
    fn scripted(outcomes: impl IntoIterator<Item = Result<BrowserOutcome, String>>) -> Arc<Self> {
        Self::gated(outcomes, 1_000)
    }

    fn gated(
        outcomes: impl IntoIterator<Item = Result<BrowserOutcome, String>>,
        permits: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            opened: Mutex::new(Vec::new()),
            gate: Semaphore::new(permits),
        })
    }
}

#[derive(Clone)]
struct FakeBrowser(Arc<Browser>);

impl ExternalBrowser for FakeBrowser {
    async fn open(&self, url: &str) -> Result<BrowserOutcome, String> {
        self.0.opened.lock().push(url.to_string());
        self.0.gate.acquire().await.unwrap().forget();
        self.0
            .script
            .lock()
            .pop_front()
            .unwrap_or(Ok(BrowserOutcome::Dismissed))
    }
}

type Flow = DonationCheckoutFlow<FakeApi, FakeBrowser>;

fn flow(donations: &Arc<Donations>, browser: &Arc<Browser>) -> (Flow, EventBus) {
    let events = EventBus::new();
    let flow = DonationCheckoutFlow::new(
        FakeApi(donations.clone()),
        FakeBrowser(browser.clone()),
        events.clone(),
    );
    (flow, events)
}

#[tokio::test]
async fn below_minimum_is_rejected_without_a_call() {
    let donations = Arc::new(Donations::default());
    let browser = Browser::scripted([]);
    let (flow, _) = flow(&donations, &browser);

    let err = flow
        .start(&DonationRequest::new("np_1", 99))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(_)));
    assert_eq!(donations.created.load(Ordering::SeqCst), 0);
    assert_eq!(flow.state().phase, CheckoutPhase::Idle);

    let outcome = flow
        .start(&DonationRequest::new("np_1", 100).for_post("p_3"))
        .await
        .unwrap();
    assert_eq!(donations.created.load(Ordering::SeqCst), 1);
    assert!(matches!(outcome, CheckoutOutcome::Cancelled { .. }));

    let sent = donations.last.lock().clone().unwrap();
    assert_eq!(sent.amount, 100);
    assert_eq!(sent.post_id.unwrap().as_str(), "p_3");
}

#[tokio::test]
async fn completed_redirect_is_not_verified_automatically() {
    let donations = Arc::new(Donations::default());
    let browser = Browser::scripted([Ok(BrowserOutcome::Completed)]);
    let (flow, events) = flow(&donations, &browser);
    let mut events = events.subscribe();

    let outcome = flow
        .start(&DonationRequest::new("np_1", 2500))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        CheckoutOutcome::Returned {
            session_id: "cs_1".into()
        }
    );
    assert_eq!(flow.state().phase, CheckoutPhase::SettledUnknown);
    assert_eq!(browser.opened.lock().as_slice(), ["https://checkout.test/cs_1"]);
    assert_eq!(donations.verified.load(Ordering::SeqCst), 0);

    let mut phases = Vec::new();
    while let Ok(ClientEvent::CheckoutStateChanged { phase, .. }) = events.try_recv() {
        phases.push(phase);
    }
    assert_eq!(
        phases,
        [
            CheckoutPhase::CreatingSession,
            CheckoutPhase::AwaitingExternalCompletion,
            CheckoutPhase::SettledUnknown,
        ]
    );

    let verified = flow.verify(outcome.session_id()).await.unwrap();
    assert!(verified.success);
    assert_eq!(donations.verified.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancel_is_terminal_and_never_verified() {
    let donations = Arc::new(Donations::default());
    let browser = Browser::scripted([Ok(BrowserOutcome::Cancelled)]);
    let (flow, _) = flow(&donations, &browser);

    let outcome = flow
        .start(&DonationRequest::new("np_1", 1000))
        .await
        .unwrap();
    assert_eq!(outcome.phase(), CheckoutPhase::Cancelled);

    let state = flow.state();
    assert_eq!(state.phase, CheckoutPhase::Cancelled);
    assert_eq!(state.session_id.unwrap().as_str(), "cs_1");
    assert_eq!(donations.verified.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn restarting_after_cancel_creates_a_fresh_session() {
    let donations = Arc::new(Donations::default());
    let browser = Browser::scripted([
        Ok(BrowserOutcome::Dismissed),
        Ok(BrowserOutcome::Completed),
    ]);
    let (flow, _) = flow(&donations, &browser);
    let req = DonationRequest::new("np_1", 5000);

    let first = flow.start(&req).await.unwrap();
    let second = flow.start(&req).await.unwrap();

    assert_ne!(first.session_id(), second.session_id());
    assert_eq!(donations.created.load(Ordering::SeqCst), 2);
    assert_eq!(
        browser.opened.lock().as_slice(),
        ["https://checkout.test/cs_1", "https://checkout.test/cs_2"]
    );
}

#[tokio::test]
async fn session_failure_returns_to_idle_with_a_user_message() {
    let donations = Arc::new(Donations::default());
    donations.fail.store(true, Ordering::SeqCst);
    let browser = Browser::scripted([]);
    let (flow, _) = flow(&donations, &browser);

    let err = flow
        .start(&DonationRequest::new("np_1", 1000))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to start donation, try again");
    match &err {
        CheckoutError::SessionCreation(source) => assert_eq!(source.status(), Some(503)),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());
    assert_eq!(flow.state().phase, CheckoutPhase::Idle);
    assert!(browser.opened.lock().is_empty());
}

#[tokio::test]
async fn browser_failure_returns_to_idle() {
    let donations = Arc::new(Donations::default());
    let browser = Browser::scripted([Err("no handler for https".to_string())]);
    let (flow, _) = flow(&donations, &browser);

    let err = flow
        .start(&DonationRequest::new("np_1", 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Browser(_)));
    assert_eq!(flow.state().phase, CheckoutPhase::Idle);
    assert_eq!(flow.state().session_id, None);
}

#[tokio::test]
async fn second_start_while_waiting_is_busy() {
    let donations = Arc::new(Donations::default());
    let browser = Browser::gated([Ok(BrowserOutcome::Completed)], 0);
    let (flow, _) = flow(&donations, &browser);
    let flow = Arc::new(flow);

    let mut state = flow.subscribe();
    let running = {
        let flow = flow.clone();
        tokio::spawn(async move { flow.start(&DonationRequest::new("np_1", 1000)).await })
    };

    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| s.phase == CheckoutPhase::AwaitingExternalCompletion),
    )
    .await
    .unwrap()
    .unwrap();

    let err = flow
        .start(&DonationRequest::new("np_1", 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Busy));

    browser.gate.add_permits(1);
    let outcome = running.await.unwrap().unwrap();
    assert_eq!(outcome.phase(), CheckoutPhase::SettledUnknown);
    assert_eq!(donations.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn abandoned_start_does_not_leave_the_flow_busy() {
    let donations = Arc::new(Donations::default());
    let browser = Browser::gated([], 0);
    let (flow, _) = flow(&donations, &browser);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        flow.start(&DonationRequest::new("np_1", 1000)),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(flow.state().phase, CheckoutPhase::Idle);

    flow.reset();
    assert_eq!(flow.state().phase, CheckoutPhase::Idle);
}
