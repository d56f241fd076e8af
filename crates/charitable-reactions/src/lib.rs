//! Optimistic like toggling.
//!
//! [`machine`] is the per-post state machine with no I/O in it. [`controller`]
//! drives one machine per mounted post: it resolves the initial state, sends
//! toggles in the background, and feeds server answers back in.

pub mod controller;
pub mod machine;

pub use controller::ReactionController;
pub use machine::{Effect, Phase, ReactionEvent, ReactionState, ReactionView, Snapshot};
