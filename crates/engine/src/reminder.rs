//! Reminder batch job.
//!
//! Each run selects appointments starting 23–25h from now that have not been
//! reminded, notifies each customer and stamps the appointment. The window is
//! wider than the trigger cadence (15 min), so an appointment missed by one run
//! is still eligible in the next; the stamp keeps it from being sent twice.
//!
//! Appointments are processed one after another and independently: a failure
//! on one is counted and logged, never propagated to the rest of the batch.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use slotwise_common::error::AppError;
use slotwise_common::plan::{PlanPolicyResolver, PlanTier};
use slotwise_common::types::data_keys as keys;
use slotwise_common::types::{
    Appointment, BatchResult, NotificationEvent, NotificationRequest, Organization,
};
use slotwise_notifier::template::Locale;
use slotwise_notifier::{DispatchOutcome, NotificationDispatcher};

use crate::links::LinkBuilder;
use crate::store::BookingStore;

/// Window start, in hours ahead of the run.
pub const REMINDER_LEAD_MIN_HOURS: i64 = 23;
/// Window end (exclusive), in hours ahead of the run.
pub const REMINDER_LEAD_MAX_HOURS: i64 = 25;

/// Zone used when an organization's timezone cannot be parsed.
const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

/// Half-open interval `[start, end)` of appointment start times due for a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReminderWindow {
    pub fn starting_from(now: DateTime<Utc>) -> Self {
        Self {
            start: now + Duration::hours(REMINDER_LEAD_MIN_HOURS),
            end: now + Duration::hours(REMINDER_LEAD_MAX_HOURS),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Format an instant as local date and time for the organization.
///
/// Returns `(date, time)`; dates are `dd/mm/yyyy` in Portuguese and
/// `mm/dd/yyyy` in English, times are 24h `HH:MM`.
pub fn format_local(instant: DateTime<Utc>, timezone: &str, locale: Locale) -> (String, String) {
    let tz = timezone.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!(timezone, fallback = DEFAULT_TIMEZONE.name(), "Unknown timezone, using fallback");
        DEFAULT_TIMEZONE
    });
    let local = instant.with_timezone(&tz);

    let date = match locale {
        Locale::PtBr => local.format("%d/%m/%Y"),
        Locale::En => local.format("%m/%d/%Y"),
    };

    (date.to_string(), local.format("%H:%M").to_string())
}

pub struct ReminderBatchJob {
    store: Arc<dyn BookingStore>,
    dispatcher: Arc<NotificationDispatcher>,
    plans: Arc<PlanPolicyResolver>,
    links: LinkBuilder,
}

impl ReminderBatchJob {
    pub fn new(
        store: Arc<dyn BookingStore>,
        dispatcher: Arc<NotificationDispatcher>,
        plans: Arc<PlanPolicyResolver>,
        links: LinkBuilder,
    ) -> Self {
        Self {
            store,
            dispatcher,
            plans,
            links,
        }
    }

    /// Run one batch now.
    pub async fn run(&self) -> Result<BatchResult, AppError> {
        self.run_at(Utc::now()).await
    }

    /// Run one batch as if the current time were `now`.
    ///
    /// Only a failure of the eligibility query is returned as an error; every
    /// per-appointment failure is folded into `BatchResult::failed`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<BatchResult, AppError> {
        let window = ReminderWindow::starting_from(now);

        let appointments = self
            .store
            .find_eligible_reminders(window)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, "Reminder eligibility query failed");
            })?;

        let mut result = BatchResult::default();

        for appointment in &appointments {
            match self.process(appointment, now).await {
                Ok(outcome) => {
                    tracing::debug!(
                        appointment_id = %appointment.id,
                        channel = %outcome.channel(),
                        delivered = outcome.is_sent(),
                        "Reminder processed"
                    );
                    result.sent += 1;
                }
                Err(e) => {
                    tracing::error!(
                        appointment_id = %appointment.id,
                        error = %e,
                        "Failed to process reminder"
                    );
                    result.failed += 1;
                }
            }
        }

        tracing::info!(
            eligible = appointments.len(),
            sent = result.sent,
            failed = result.failed,
            window_start = %window.start,
            window_end = %window.end,
            "Reminder batch finished"
        );

        Ok(result)
    }

    async fn process(
        &self,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, AppError> {
        let organization = self
            .store
            .find_organization(appointment.organization_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Organization {} not found", appointment.organization_id))
            })?;

        let service = self
            .store
            .find_service(appointment.service_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Service {} not found", appointment.service_id))
            })?;

        let plan_type = self.plan_type(&organization).await?;
        let request = self.build_request(appointment, &organization, &service.name, plan_type);

        let outcome = self.dispatcher.send(request).await;

        self.store.mark_reminder_sent(appointment.id, now).await?;

        Ok(outcome)
    }

    async fn plan_type(&self, organization: &Organization) -> Result<String, AppError> {
        let snapshot = self.store.find_subscription(organization.id).await?;

        let tier = match &snapshot {
            Some(snapshot) => {
                let (tier, fallback_applied) = self.plans.resolve_or_essential(snapshot);
                if fallback_applied {
                    tracing::warn!(
                        organization_id = %organization.id,
                        price_id = snapshot.price_id.as_deref().unwrap_or("none"),
                        status = %snapshot.status,
                        action = "fallback_essential",
                        "Unresolved subscription price, using essential tier"
                    );
                }
                tier
            }
            None => {
                tracing::warn!(
                    organization_id = %organization.id,
                    action = "fallback_essential",
                    "No subscription found, using essential tier"
                );
                PlanTier::fail_safe()
            }
        };

        Ok(tier.plan.to_string())
    }

    fn build_request(
        &self,
        appointment: &Appointment,
        organization: &Organization,
        service_name: &str,
        plan_type: String,
    ) -> NotificationRequest {
        let locale = Locale::from_tag(&organization.locale);
        let (date, time) = format_local(appointment.start_datetime, &organization.timezone, locale);
        let links = self
            .links
            .for_appointment(&organization.slug, &appointment.management_token);

        let data: HashMap<String, String> = [
            (keys::CUSTOMER_NAME, appointment.customer_name.clone()),
            (keys::ORGANIZATION_NAME, organization.name.clone()),
            (keys::SERVICE_NAME, service_name.to_string()),
            (keys::DATE, date),
            (keys::TIME, time),
            (keys::CANCEL_URL, links.cancel_url),
            (keys::RESCHEDULE_URL, links.reschedule_url),
            (keys::CANCEL_PATH, links.cancel_path),
            (keys::RESCHEDULE_PATH, links.reschedule_path),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        NotificationRequest {
            event: NotificationEvent::AppointmentReminder,
            organization_id: organization.id,
            recipient_phone: appointment.customer_phone.clone(),
            recipient_email: appointment.customer_email.clone(),
            locale: organization.locale.clone(),
            data,
            plan_type,
        }
    }
}
