use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use charitable_api::ReactionApi;
use charitable_identity::{GuestIdentity, SecureStore};
use charitable_types::events::{ClientEvent, EventBus};
use charitable_types::ids::{GuestId, PostId};

use crate::machine::{Effect, Phase, ReactionEvent, ReactionState, ReactionView};

struct Entry {
    state: ReactionState,
    view_tx: watch::Sender<ReactionView>,
    /// False once unmounted. An unmounted entry is kept only while its
    /// toggle is still on the wire, so a remount adopts that toggle instead
    /// of starting a second one.
    mounted: bool,
    /// Bumped on every toggle sent. A liked read started in an earlier epoch
    /// is older than the toggle's answer and gets dropped.
    epoch: u64,
}

impl Entry {
    fn in_flight(&self) -> bool {
        matches!(self.state.phase(), Phase::Toggling { .. })
    }
}

/// Outcome of feeding one event to a post's machine.
struct Applied {
    effect: Effect,
    view: ReactionView,
    mounted: bool,
}

struct Inner<A, S> {
    api: A,
    identity: Arc<GuestIdentity<S>>,
    posts: Mutex<HashMap<PostId, Entry>>,
    events: EventBus,
}

/// Drives one [`ReactionState`] per mounted post.
///
/// `tap` never waits on the network: it applies the optimistic change, hands
/// any resulting toggle to a background task, and returns. Different posts
/// are fully independent; for a single post the state machine allows at most
/// one toggle on the wire. Must be used inside a Tokio runtime.
pub struct ReactionController<A, S> {
    inner: Arc<Inner<A, S>>,
}

impl<A, S> Clone for ReactionController<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: ReactionApi, S: SecureStore> ReactionController<A, S> {
    pub fn new(api: A, identity: Arc<GuestIdentity<S>>, events: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                identity,
                posts: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Start tracking a post and kick off the initial liked read.
    ///
    /// Mounting a post that is already tracked returns a new receiver for the
    /// existing state and does not re-read. That includes a post unmounted
    /// while its toggle was still on the wire: the remount waits for that
    /// toggle's answer rather than sending another.
    pub fn mount(&self, post_id: PostId, initial_count: u64) -> watch::Receiver<ReactionView> {
        let mut posts = self.inner.posts.lock();
        if let Some(entry) = posts.get_mut(&post_id) {
            if !entry.mounted {
                debug!(post_id = %post_id, "remounted with a toggle in flight");
                entry.mounted = true;
            }
            return entry.view_tx.subscribe();
        }

        let state = ReactionState::new(initial_count);
        let (view_tx, view_rx) = watch::channel(state.view());
        posts.insert(
            post_id.clone(),
            Entry {
                state,
                view_tx,
                mounted: true,
                epoch: 0,
            },
        );
        drop(posts);

        self.spawn_check(post_id, 0);
        view_rx
    }

    /// Stop tracking a post. A toggle still on the wire is allowed to land
    /// but publishes nothing.
    pub fn unmount(&self, post_id: &PostId) {
        let mut posts = self.inner.posts.lock();
        let Some(entry) = posts.get_mut(post_id) else {
            return;
        };
        if entry.in_flight() {
            entry.mounted = false;
        } else {
            posts.remove(post_id);
        }
    }

    pub fn view(&self, post_id: &PostId) -> Option<ReactionView> {
        self.inner
            .posts
            .lock()
            .get(post_id)
            .filter(|entry| entry.mounted)
            .map(|entry| entry.state.view())
    }

    pub fn subscribe(&self, post_id: &PostId) -> Option<watch::Receiver<ReactionView>> {
        self.inner
            .posts
            .lock()
            .get(post_id)
            .filter(|entry| entry.mounted)
            .map(|entry| entry.view_tx.subscribe())
    }

    /// The user tapped the like affordance. Returns the view to render right
    /// away, or `None` if the post is not mounted.
    pub fn tap(&self, post_id: &PostId) -> Option<ReactionView> {
        let applied = self.apply(post_id, ReactionEvent::Tap, None)?;
        let view = applied.view;
        self.handle(post_id.clone(), applied, None);
        Some(view)
    }

    /// Re-run the liked read, e.g. after the identity became available.
    pub fn refresh(&self, post_id: &PostId) {
        let epoch = self
            .inner
            .posts
            .lock()
            .get(post_id)
            .filter(|entry| entry.mounted)
            .map(|entry| entry.epoch);
        if let Some(epoch) = epoch {
            self.spawn_check(post_id.clone(), epoch);
        }
    }

    /// Feed `event` to the post's machine. `read_epoch` is set for liked
    /// reads and drops the answer if a toggle went out after the read began.
    fn apply(
        &self,
        post_id: &PostId,
        event: ReactionEvent,
        read_epoch: Option<u64>,
    ) -> Option<Applied> {
        let mut posts = self.inner.posts.lock();
        let entry = posts.get_mut(post_id)?;

        if event == ReactionEvent::Tap && !entry.mounted {
            return None;
        }
        if read_epoch.is_some_and(|epoch| epoch != entry.epoch) {
            debug!(post_id = %post_id, ?event, "stale liked read dropped");
            return None;
        }

        let effect = entry.state.apply(event);
        if effect == Effect::SendToggle {
            entry.epoch += 1;
        }
        let view = entry.state.view();
        entry.view_tx.send_replace(view);
        let mounted = entry.mounted;
        debug!(post_id = %post_id, ?event, ?effect, mounted, "reaction transition");

        if !mounted && !entry.in_flight() {
            posts.remove(post_id);
        }
        Some(Applied {
            effect,
            view,
            mounted,
        })
    }

    fn handle(&self, post_id: PostId, applied: Applied, failure: Option<String>) {
        if !applied.mounted {
            // Nobody is watching; only finish what the user already asked for.
            if applied.effect == Effect::SendToggle {
                self.spawn_toggle(post_id);
            }
            return;
        }

        match applied.effect {
            Effect::None => {}
            Effect::SendToggle => self.spawn_toggle(post_id),
            Effect::Settled(snapshot) => self.inner.events.publish(ClientEvent::ReactionSettled {
                post_id,
                liked: snapshot.liked,
                count: snapshot.count,
            }),
            Effect::RolledBack(snapshot) => {
                let message = failure.unwrap_or_else(|| "reaction failed".into());
                warn!(
                    post_id = %post_id,
                    liked = snapshot.liked,
                    count = snapshot.count,
                    "toggle failed, rolled back: {}",
                    message
                );
                self.inner
                    .events
                    .publish(ClientEvent::ReactionRolledBack { post_id, message });
            }
        }
    }

    async fn guest_id(&self) -> Option<GuestId> {
        match self.inner.identity.get_or_create().await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("guest identity unavailable: {:#}", e);
                self.inner.events.publish(ClientEvent::IdentityUnavailable {
                    message: e.to_string(),
                });
                None
            }
        }
    }

    fn spawn_check(&self, post_id: PostId, epoch: u64) {
        let this = self.clone();
        tokio::spawn(async move {
            let Some(guest) = this.guest_id().await else {
                // Stay unknown; taps keep queueing until a refresh succeeds.
                this.apply(&post_id, ReactionEvent::CheckFailed, Some(epoch));
                return;
            };

            let event = match this.inner.api.check_reaction(&post_id, guest).await {
                Ok(resp) => ReactionEvent::Checked { liked: resp.liked },
                Err(e) => {
                    warn!(post_id = %post_id, "liked check failed: {}", e);
                    ReactionEvent::CheckFailed
                }
            };

            if let Some(applied) = this.apply(&post_id, event, Some(epoch)) {
                this.handle(post_id, applied, None);
            }
        });
    }

    fn spawn_toggle(&self, post_id: PostId) {
        let this = self.clone();
        tokio::spawn(async move {
            let (event, failure) = match this.guest_id().await {
                Some(guest) => match this.inner.api.toggle_reaction(&post_id, guest).await {
                    Ok(resp) => (
                        ReactionEvent::ToggleSucceeded {
                            liked: resp.liked,
                            count: resp.count,
                        },
                        None,
                    ),
                    Err(e) => (ReactionEvent::ToggleFailed, Some(e.to_string())),
                },
                None => (
                    ReactionEvent::ToggleFailed,
                    Some("guest identity unavailable".into()),
                ),
            };

            if let Some(applied) = this.apply(&post_id, event, None) {
                this.handle(post_id, applied, failure);
            }
        });
    }
}
