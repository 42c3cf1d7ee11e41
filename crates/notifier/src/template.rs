//! Event → channel artifact tables and payload builders.
//!
//! Chat templates take positional parameters, so the order of the body
//! parameters below must match the placeholders registered with the provider.

use std::collections::HashMap;

use serde::Serialize;

use slotwise_common::types::NotificationEvent;
use slotwise_common::types::data_keys as keys;

use crate::provider::{AppointmentEmail, RescheduleEmail, TemplateComponent, TemplateParameter};

/// Customer-facing language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Locale {
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en")]
    En,
}

impl Locale {
    /// Parse a BCP 47 tag. Anything not English falls back to Brazilian Portuguese.
    pub fn from_tag(tag: &str) -> Self {
        if tag == "en" || tag.starts_with("en-") {
            Locale::En
        } else {
            Locale::PtBr
        }
    }

    /// Language code expected by the chat provider.
    pub fn language_code(&self) -> &'static str {
        match self {
            Locale::PtBr => "pt_BR",
            Locale::En => "en_US",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::PtBr => write!(f, "pt-BR"),
            Locale::En => write!(f, "en"),
        }
    }
}

pub fn chat_template_name(event: NotificationEvent) -> &'static str {
    match event {
        NotificationEvent::AppointmentConfirmed => "appointment_confirmation",
        NotificationEvent::AppointmentCancelled => "appointment_cancellation",
        NotificationEvent::AppointmentRescheduled => "appointment_reschedule",
        NotificationEvent::AppointmentReminder => "appointment_reminder",
    }
}

/// Data keys the event's payload cannot be meaningfully rendered without.
pub fn required_fields(event: NotificationEvent) -> &'static [&'static str] {
    match event {
        NotificationEvent::AppointmentRescheduled => &[
            keys::CUSTOMER_NAME,
            keys::ORGANIZATION_NAME,
            keys::SERVICE_NAME,
            keys::OLD_DATE,
            keys::OLD_TIME,
            keys::NEW_DATE,
            keys::NEW_TIME,
        ],
        _ => &[
            keys::CUSTOMER_NAME,
            keys::ORGANIZATION_NAME,
            keys::SERVICE_NAME,
            keys::DATE,
            keys::TIME,
        ],
    }
}

pub fn missing_fields(event: NotificationEvent, data: &HashMap<String, String>) -> Vec<&'static str> {
    required_fields(event)
        .iter()
        .copied()
        .filter(|key| data.get(*key).is_none_or(|v| v.is_empty()))
        .collect()
}

/// URL button slots as registered on the templates. A missing link leaves its
/// slot empty; the other button keeps its index.
const LINK_BUTTONS: [(usize, &str); 2] = [(0, keys::RESCHEDULE_PATH), (1, keys::CANCEL_PATH)];

/// Build the ordered chat template components for an event.
///
/// Missing fields become empty strings.
pub fn chat_components(
    event: NotificationEvent,
    data: &HashMap<String, String>,
) -> Vec<TemplateComponent> {
    let body = required_fields(event)
        .iter()
        .map(|key| TemplateParameter::text(field(data, key)))
        .collect();

    let mut components = vec![TemplateComponent::Body { parameters: body }];

    // Cancelled appointments have nothing left to manage.
    if event != NotificationEvent::AppointmentCancelled {
        for (index, key) in LINK_BUTTONS {
            let Some(suffix) = data.get(key).filter(|v| !v.is_empty()) else {
                continue;
            };
            components.push(TemplateComponent::Button {
                sub_type: "url".to_string(),
                index: index.to_string(),
                parameters: vec![TemplateParameter::text(suffix.clone())],
            });
        }
    }

    components
}

/// An email payload tagged with the provider operation that sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailMessage {
    Confirmation(AppointmentEmail),
    Cancellation(AppointmentEmail),
    Reschedule(RescheduleEmail),
    Reminder(AppointmentEmail),
}

pub fn build_email(
    event: NotificationEvent,
    to: &str,
    locale: Locale,
    data: &HashMap<String, String>,
) -> EmailMessage {
    let links = event != NotificationEvent::AppointmentCancelled;
    let link = |key: &str| {
        if links {
            data.get(key).filter(|v| !v.is_empty()).cloned()
        } else {
            None
        }
    };

    let appointment_email = || AppointmentEmail {
        to: to.to_string(),
        locale,
        customer_name: field(data, keys::CUSTOMER_NAME),
        organization_name: field(data, keys::ORGANIZATION_NAME),
        service_name: field(data, keys::SERVICE_NAME),
        date: field(data, keys::DATE),
        time: field(data, keys::TIME),
        cancel_url: link(keys::CANCEL_URL),
        reschedule_url: link(keys::RESCHEDULE_URL),
    };

    match event {
        NotificationEvent::AppointmentConfirmed => EmailMessage::Confirmation(appointment_email()),
        NotificationEvent::AppointmentCancelled => EmailMessage::Cancellation(appointment_email()),
        NotificationEvent::AppointmentReminder => EmailMessage::Reminder(appointment_email()),
        NotificationEvent::AppointmentRescheduled => EmailMessage::Reschedule(RescheduleEmail {
            to: to.to_string(),
            locale,
            customer_name: field(data, keys::CUSTOMER_NAME),
            organization_name: field(data, keys::ORGANIZATION_NAME),
            service_name: field(data, keys::SERVICE_NAME),
            old_date: field(data, keys::OLD_DATE),
            old_time: field(data, keys::OLD_TIME),
            new_date: field(data, keys::NEW_DATE),
            new_time: field(data, keys::NEW_TIME),
            cancel_url: link(keys::CANCEL_URL),
            reschedule_url: link(keys::RESCHEDULE_URL),
        }),
    }
}

fn field(data: &HashMap<String, String>, key: &str) -> String {
    data.get(key).cloned().unwrap_or_default()
}
