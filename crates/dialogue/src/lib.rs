//! Pre-job configuration dialogue.
//!
//! Before an audit job exists, the client runs a short scripted chat that
//! collects competitor sites and a target market, then submits the job.
//! The machine is strictly linear — no step is ever revisited:
//!
//! `CollectingCompetitors → CollectingMarket → Submitting → Done`
//!
//! The assistant messages are revealed with a cancellable word-by-word
//! [`typing`] effect; the parsing rules for free-text replies live in
//! [`script`].

pub mod script;
pub mod state;
pub mod typing;

pub use script::{parse_competitors, parse_market};
pub use state::{Collected, Dialogue, DialogueAction, DialogueStep};
pub use typing::TypingEffect;
