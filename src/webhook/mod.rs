//! Outbound webhook delivery.
//!
//! An issue action produces a [`WebhookEvent`]; the [`WebhookDispatcher`]
//! fans it out to every active webhook of the project:
//!
//! 1. [`render`] decides whether the event notifies at all and what it says
//! 2. [`payload`] encodes it per the webhook's [`PayloadKind`]
//! 3. [`signing`] signs the exact body bytes with the webhook secret
//! 4. a [`Transport`] POSTs it
//! 5. the webhook's health counters are updated and persisted
//!
//! [`PayloadKind`]: crate::model::PayloadKind

pub mod dispatcher;
pub mod event;
pub mod payload;
pub mod render;
pub mod signing;
pub mod transport;

pub use dispatcher::{DeliveryReport, FAILURE_THRESHOLD, WebhookDispatcher};
pub use event::{EventKind, WebhookEvent};
pub use render::{EmbedAuthor, RichEmbed, RichMessage, render};
pub use signing::{SIGNATURE_HEADER, sign, verify};
pub use transport::{HttpTransport, Transport};

use thiserror::Error;

/// Why a single delivery attempt failed.
///
/// Counted against the webhook's health; never returned from `notify`.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered outside 2xx.
    #[error("endpoint returned status {0}")]
    Status(u16),

    /// The payload could not be encoded.
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
