//! Notification dispatcher.
//!
//! Resolves the channel for a request, builds the channel payload, invokes the
//! provider and reports the outcome. `send` never returns an error: provider
//! failures are logged, returned as [`DispatchOutcome::Failed`] and forwarded to
//! the optional observer so one recipient cannot break a caller's loop.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use uuid::Uuid;

use slotwise_common::types::{Channel, NotificationEvent, NotificationRequest};

use crate::channel::ChannelResolver;
use crate::provider::{ChatProvider, EmailProvider, TemplateMessage};
use crate::template::{self, EmailMessage, Locale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingRecipientEmail,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingRecipientEmail => write!(f, "missing_recipient_email"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent {
        channel: Channel,
        message_id: Option<String>,
    },
    Skipped {
        channel: Channel,
        reason: SkipReason,
    },
    Failed {
        channel: Channel,
        error: String,
    },
}

impl DispatchOutcome {
    pub fn channel(&self) -> Channel {
        match self {
            DispatchOutcome::Sent { channel, .. }
            | DispatchOutcome::Skipped { channel, .. }
            | DispatchOutcome::Failed { channel, .. } => *channel,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }
}

/// Outcome of one dispatch, as delivered to an observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub event: NotificationEvent,
    pub organization_id: Uuid,
    pub outcome: DispatchOutcome,
}

pub struct NotificationDispatcher {
    chat: Arc<dyn ChatProvider>,
    email: Arc<dyn EmailProvider>,
    observer: Option<UnboundedSender<DispatchReport>>,
}

impl NotificationDispatcher {
    pub fn new(chat: Arc<dyn ChatProvider>, email: Arc<dyn EmailProvider>) -> Self {
        Self {
            chat,
            email,
            observer: None,
        }
    }

    /// Forward every outcome to `observer` (e.g. an alerting pipeline).
    pub fn with_observer(mut self, observer: UnboundedSender<DispatchReport>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Deliver a notification and report what happened. Never fails.
    pub async fn send(&self, request: NotificationRequest) -> DispatchOutcome {
        let outcome = self.deliver(&request).await;

        match &outcome {
            DispatchOutcome::Sent { channel, .. } => {
                tracing::info!(
                    channel = %channel,
                    event = %request.event,
                    organization_id = %request.organization_id,
                    "Notification sent"
                );
            }
            DispatchOutcome::Skipped { channel, reason } => {
                tracing::warn!(
                    channel = %channel,
                    event = %request.event,
                    organization_id = %request.organization_id,
                    reason = %reason,
                    "Notification skipped, no recipient for resolved channel"
                );
            }
            DispatchOutcome::Failed { channel, error } => {
                tracing::error!(
                    channel = %channel,
                    event = %request.event,
                    organization_id = %request.organization_id,
                    error = %error,
                    "Notification delivery failed"
                );
            }
        }

        if let Some(observer) = &self.observer {
            let report = DispatchReport {
                event: request.event,
                organization_id: request.organization_id,
                outcome: outcome.clone(),
            };
            // A dropped receiver only means nobody is watching anymore.
            let _ = observer.send(report);
        }

        outcome
    }

    /// Fire-and-forget form of [`send`](Self::send). The handle may be dropped.
    pub fn spawn(self: &Arc<Self>, request: NotificationRequest) -> JoinHandle<DispatchOutcome> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.send(request).await })
    }

    async fn deliver(&self, request: &NotificationRequest) -> DispatchOutcome {
        let channel =
            ChannelResolver::resolve(request.recipient_phone.as_deref(), &request.plan_type);
        let locale = Locale::from_tag(&request.locale);

        let missing = template::missing_fields(request.event, &request.data);
        if !missing.is_empty() {
            tracing::warn!(
                event = %request.event,
                organization_id = %request.organization_id,
                missing = ?missing,
                "Notification data incomplete, sending with blank fields"
            );
        }

        match channel {
            Channel::Chat => self.deliver_chat(request, locale).await,
            Channel::Email => self.deliver_email(request, locale).await,
        }
    }

    async fn deliver_chat(&self, request: &NotificationRequest, locale: Locale) -> DispatchOutcome {
        let channel = Channel::Chat;
        let message = TemplateMessage {
            to: request.recipient_phone.clone().unwrap_or_default(),
            template_name: template::chat_template_name(request.event).to_string(),
            language_code: locale.language_code().to_string(),
            components: template::chat_components(request.event, &request.data),
        };

        match self.chat.send_template(&message).await {
            Ok(receipt) if receipt.success => DispatchOutcome::Sent {
                channel,
                message_id: Some(receipt.message_id),
            },
            Ok(_) => DispatchOutcome::Failed {
                channel,
                error: format!("{} reported the message as not accepted", self.chat.name()),
            },
            Err(e) => DispatchOutcome::Failed {
                channel,
                error: e.to_string(),
            },
        }
    }

    async fn deliver_email(&self, request: &NotificationRequest, locale: Locale) -> DispatchOutcome {
        let channel = Channel::Email;
        let Some(to) = request
            .recipient_email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
        else {
            return DispatchOutcome::Skipped {
                channel,
                reason: SkipReason::MissingRecipientEmail,
            };
        };

        let result = match template::build_email(request.event, to, locale, &request.data) {
            EmailMessage::Confirmation(email) => self.email.send_confirmation(&email).await,
            EmailMessage::Cancellation(email) => self.email.send_cancellation(&email).await,
            EmailMessage::Reschedule(email) => self.email.send_reschedule(&email).await,
            EmailMessage::Reminder(email) => self.email.send_reminder(&email).await,
        };

        match result {
            Ok(()) => DispatchOutcome::Sent {
                channel,
                message_id: None,
            },
            Err(e) => DispatchOutcome::Failed {
                channel,
                error: e.to_string(),
            },
        }
    }
}
