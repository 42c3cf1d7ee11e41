use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Statuses that still expect the customer to show up and therefore get reminders.
    pub const REMINDABLE: [AppointmentStatus; 2] =
        [AppointmentStatus::Pending, AppointmentStatus::Confirmed];

    pub fn is_remindable(&self) -> bool {
        Self::REMINDABLE.contains(self)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// Billing subscription status, as mirrored from the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Unpaid,
    Paused,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Trialing => write!(f, "trialing"),
            SubscriptionStatus::PastDue => write!(f, "past_due"),
            SubscriptionStatus::Canceled => write!(f, "canceled"),
            SubscriptionStatus::Incomplete => write!(f, "incomplete"),
            SubscriptionStatus::IncompleteExpired => write!(f, "incomplete_expired"),
            SubscriptionStatus::Unpaid => write!(f, "unpaid"),
            SubscriptionStatus::Paused => write!(f, "paused"),
        }
    }
}

/// Named subscription level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Essential,
    Professional,
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanType::Essential => write!(f, "essential"),
            PlanType::Professional => write!(f, "professional"),
        }
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "essential" => Ok(PlanType::Essential),
            "professional" => Ok(PlanType::Professional),
            other => Err(format!("unknown plan type '{}'", other)),
        }
    }
}

/// Outbound notification transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Chat,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Chat => write!(f, "chat"),
        }
    }
}

/// Customer-facing appointment events that produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationEvent {
    #[serde(rename = "appointment.confirmed")]
    AppointmentConfirmed,
    #[serde(rename = "appointment.cancelled")]
    AppointmentCancelled,
    #[serde(rename = "appointment.rescheduled")]
    AppointmentRescheduled,
    #[serde(rename = "appointment.reminder")]
    AppointmentReminder,
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationEvent::AppointmentConfirmed => write!(f, "appointment.confirmed"),
            NotificationEvent::AppointmentCancelled => write!(f, "appointment.cancelled"),
            NotificationEvent::AppointmentRescheduled => write!(f, "appointment.rescheduled"),
            NotificationEvent::AppointmentReminder => write!(f, "appointment.reminder"),
        }
    }
}

/// A tenant of the booking platform.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    /// IANA zone name, e.g. `America/Sao_Paulo`
    pub timezone: String,
    /// BCP 47 tag used for customer-facing messages, e.g. `pt-BR`
    pub locale: String,
    pub created_at: DateTime<Utc>,
}

/// A bookable service offered by an organization.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub active: bool,
}

/// A booked appointment, as read by the reminder job.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub service_id: Uuid,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub status: AppointmentStatus,
    /// Opaque token embedded in the customer's self-service links.
    pub management_token: String,
    pub reminder_sent_at: Option<DateTime<Utc>>,
}

/// Read-only projection of an organization's billing subscription.
///
/// Always read fresh before a policy decision; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubscriptionSnapshot {
    pub price_id: Option<String>,
    pub status: SubscriptionStatus,
}

/// A single outbound notification, built by the caller and consumed once by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub event: NotificationEvent,
    pub organization_id: Uuid,
    pub recipient_phone: Option<String>,
    pub recipient_email: Option<String>,
    pub locale: String,
    /// Event data keyed by the constants in [`data_keys`].
    pub data: HashMap<String, String>,
    /// Plan name as stored/resolved by the caller; unknown names are tolerated.
    pub plan_type: String,
}

/// Keys used in [`NotificationRequest::data`].
pub mod data_keys {
    pub const CUSTOMER_NAME: &str = "customer_name";
    pub const ORGANIZATION_NAME: &str = "organization_name";
    pub const SERVICE_NAME: &str = "service_name";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const OLD_DATE: &str = "old_date";
    pub const OLD_TIME: &str = "old_time";
    pub const NEW_DATE: &str = "new_date";
    pub const NEW_TIME: &str = "new_time";
    /// Absolute URLs, used by email.
    pub const CANCEL_URL: &str = "cancel_url";
    pub const RESCHEDULE_URL: &str = "reschedule_url";
    /// Path suffixes appended to the chat template's URL buttons.
    pub const CANCEL_PATH: &str = "cancel_path";
    pub const RESCHEDULE_PATH: &str = "reschedule_path";
}

/// Aggregate outcome of one reminder batch run. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub sent: u32,
    pub failed: u32,
}
