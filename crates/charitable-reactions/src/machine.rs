/// Like state and counter at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub liked: bool,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial read still outstanding. `tap_pending` is set after an odd
    /// number of taps and replayed once the read lands.
    Unknown { tap_pending: bool },

    /// Matches the last server answer.
    Settled { liked: bool },

    /// Exactly one toggle is on the wire, sent expecting `sent`. A failure
    /// restores `before`; `desired` tracks the latest tap while we wait.
    Toggling {
        before: Snapshot,
        sent: bool,
        desired: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionEvent {
    Checked { liked: bool },
    CheckFailed,
    Tap,
    ToggleSucceeded { liked: bool, count: Option<u64> },
    ToggleFailed,
}

/// What the driver has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    SendToggle,
    Settled(Snapshot),
    RolledBack(Snapshot),
}

/// What a screen renders. `liked == None` means "don't know yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionView {
    pub liked: Option<bool>,
    pub count: u64,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionState {
    phase: Phase,
    count: u64,
}

fn nudge(count: u64, liked: bool) -> u64 {
    if liked {
        count.saturating_add(1)
    } else {
        count.saturating_sub(1)
    }
}

/// Counter to show while `desired` is in flight on top of `base`.
fn displayed(base: Snapshot, desired: bool) -> u64 {
    if desired == base.liked {
        base.count
    } else {
        nudge(base.count, desired)
    }
}

impl ReactionState {
    pub fn new(initial_count: u64) -> Self {
        Self {
            phase: Phase::Unknown { tap_pending: false },
            count: initial_count,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn view(&self) -> ReactionView {
        match self.phase {
            Phase::Unknown { .. } => ReactionView {
                liked: None,
                count: self.count,
                pending: false,
            },
            Phase::Settled { liked } => ReactionView {
                liked: Some(liked),
                count: self.count,
                pending: false,
            },
            Phase::Toggling { desired, .. } => ReactionView {
                liked: Some(desired),
                count: self.count,
                pending: true,
            },
        }
    }

    /// Total over every (phase, event) pair. Events that make no sense in
    /// the current phase leave the state untouched.
    pub fn apply(&mut self, event: ReactionEvent) -> Effect {
        match (self.phase, event) {
            (Phase::Unknown { tap_pending }, ReactionEvent::Checked { liked }) => {
                self.phase = Phase::Settled { liked };
                if tap_pending {
                    self.begin_toggle(liked)
                } else {
                    Effect::None
                }
            }
            (Phase::Unknown { tap_pending }, ReactionEvent::Tap) => {
                self.phase = Phase::Unknown {
                    tap_pending: !tap_pending,
                };
                Effect::None
            }

            (Phase::Settled { .. }, ReactionEvent::Checked { liked }) => {
                self.phase = Phase::Settled { liked };
                Effect::None
            }
            (Phase::Settled { liked }, ReactionEvent::Tap) => self.begin_toggle(liked),

            (
                Phase::Toggling {
                    before,
                    sent,
                    desired,
                },
                ReactionEvent::Tap,
            ) => {
                let desired = !desired;
                self.phase = Phase::Toggling {
                    before,
                    sent,
                    desired,
                };
                self.count = displayed(before, desired);
                Effect::None
            }
            (
                Phase::Toggling {
                    before,
                    sent,
                    desired,
                },
                ReactionEvent::ToggleSucceeded { liked, count },
            ) => {
                let server = Snapshot {
                    liked,
                    count: count.unwrap_or_else(|| displayed(before, liked)),
                };
                // No change of mind while in flight: the server answer stands,
                // even when it disagrees with the optimistic guess.
                if desired == server.liked || desired == sent {
                    self.phase = Phase::Settled { liked };
                    self.count = server.count;
                    Effect::Settled(server)
                } else {
                    self.phase = Phase::Toggling {
                        before: server,
                        sent: desired,
                        desired,
                    };
                    self.count = displayed(server, desired);
                    Effect::SendToggle
                }
            }
            (Phase::Toggling { before, .. }, ReactionEvent::ToggleFailed) => {
                self.phase = Phase::Settled {
                    liked: before.liked,
                };
                self.count = before.count;
                Effect::RolledBack(before)
            }

            (Phase::Unknown { .. }, ReactionEvent::CheckFailed)
            | (Phase::Unknown { .. }, ReactionEvent::ToggleSucceeded { .. })
            | (Phase::Unknown { .. }, ReactionEvent::ToggleFailed)
            | (Phase::Settled { .. }, ReactionEvent::CheckFailed)
            | (Phase::Settled { .. }, ReactionEvent::ToggleSucceeded { .. })
            | (Phase::Settled { .. }, ReactionEvent::ToggleFailed)
            | (Phase::Toggling { .. }, ReactionEvent::Checked { .. })
            | (Phase::Toggling { .. }, ReactionEvent::CheckFailed) => Effect::None,
        }
    }

    fn begin_toggle(&mut self, liked: bool) -> Effect {
        let before = Snapshot {
            liked,
            count: self.count,
        };
        let desired = !liked;
        self.phase = Phase::Toggling {
            before,
            sent: desired,
            desired,
        };
        self.count = displayed(before, desired);
        Effect::SendToggle
    }
}
