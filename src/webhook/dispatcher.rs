//! Fan-out with per-webhook health tracking.
//!
//! Each webhook carries a consecutive-failure counter. A success resets it;
//! reaching [`FAILURE_THRESHOLD`] deactivates the webhook until an operator
//! re-enables it. The read-increment-persist of the counter is not
//! transactional against a concurrent `notify` for the same project.

use crate::error::Result;
use crate::model::{PayloadKind, Project, Webhook};
use crate::storage::WebhookStore;
use crate::webhook::DeliveryError;
use crate::webhook::event::WebhookEvent;
use crate::webhook::payload::{generic_body, platform_body};
use crate::webhook::render::{RichMessage, render};
use crate::webhook::signing::sign;
use crate::webhook::transport::Transport;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Consecutive failures that deactivate a webhook.
pub const FAILURE_THRESHOLD: u8 = 5;

/// Outcome counts for one `notify` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Requests sent (delivered + failed).
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Active webhooks skipped because the event does not notify.
    pub suppressed: usize,
    /// Webhooks deactivated by this call.
    pub disabled: usize,
}

/// Delivers project events to the project's webhooks.
pub struct WebhookDispatcher<'a, S, T> {
    store: &'a S,
    transport: T,
    base_url: String,
}

impl<'a, S: WebhookStore, T: Transport> WebhookDispatcher<'a, S, T> {
    /// `base_url` prefixes issue links in rendered messages.
    pub fn new(store: &'a S, transport: T, base_url: impl Into<String>) -> Self {
        Self {
            store,
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Deliver `event` to every active webhook of `project`, one at a time.
    ///
    /// Delivery failures are logged and counted, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if webhooks cannot be loaded or their health
    /// cannot be persisted.
    pub fn notify(&self, project: &Project, event: &WebhookEvent) -> Result<DeliveryReport> {
        let webhooks = self.store.webhooks_for_project(project.id)?;
        debug!(
            project_id = %project.id,
            event = %event.kind(),
            webhooks = webhooks.len(),
            "Dispatching webhook event"
        );

        let mut report = DeliveryReport::default();
        let Some(message) = render(project, event, &self.base_url) else {
            report.suppressed = webhooks.iter().filter(|w| w.active).count();
            debug!(event = %event.kind(), "Event does not notify");
            return Ok(report);
        };

        for mut webhook in webhooks.into_iter().filter(|w| w.active) {
            report.attempted += 1;
            let outcome = self.deliver(project, event, &message, &webhook);

            match &outcome {
                Ok(()) => {
                    report.delivered += 1;
                    debug!(webhook_id = %webhook.id, "Webhook delivered");
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        webhook_id = %webhook.id,
                        url = %webhook.url,
                        failures = webhook.failure_count.saturating_add(1),
                        error = %err,
                        "Webhook delivery failed"
                    );
                }
            }

            if record_outcome(&mut webhook, outcome.is_ok()) {
                report.disabled += 1;
                info!(
                    webhook_id = %webhook.id,
                    project_id = %project.id,
                    "Webhook disabled after repeated failures"
                );
            }
            self.store.update_webhook(&webhook)?;
        }

        Ok(report)
    }

    fn deliver(
        &self,
        project: &Project,
        event: &WebhookEvent,
        message: &RichMessage,
        webhook: &Webhook,
    ) -> std::result::Result<(), DeliveryError> {
        let body = match webhook.payload_kind {
            PayloadKind::Generic => serde_json::to_vec(&generic_body(project, event))?,
            PayloadKind::PlatformFormatted => serde_json::to_vec(&platform_body(message))?,
        };
        let signature = sign(&body, &webhook.secret);

        let status = self
            .transport
            .post(&webhook.url, &body, signature.as_deref())?;
        if (200..=299).contains(&status) {
            Ok(())
        } else {
            Err(DeliveryError::Status(status))
        }
    }
}

/// Apply one attempt to the webhook's health. Returns `true` if this attempt
/// deactivated it.
pub fn record_outcome(webhook: &mut Webhook, delivered: bool) -> bool {
    if delivered {
        webhook.failure_count = 0;
        return false;
    }
    webhook.failure_count = webhook.failure_count.saturating_add(1);
    if webhook.failure_count >= FAILURE_THRESHOLD && webhook.active {
        webhook.active = false;
        return true;
    }
    false
}
