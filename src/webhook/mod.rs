//! Webhook events and the relay that acts on them.

pub mod event;
pub mod relay;

pub use event::{EventKind, WebhookEvent};
pub use relay::{Relay, RelayOutcome};
