//! Persistence seam for the reminder job and the limit guard.
//!
//! This subsystem only reads appointments, organizations, services and
//! subscriptions; its single write is the reminder timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use slotwise_common::error::AppError;
use slotwise_common::types::{
    Appointment, AppointmentStatus, Organization, Service, SubscriptionSnapshot,
};

use crate::reminder::ReminderWindow;

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Remindable appointments starting inside `window` that have not been reminded yet.
    async fn find_eligible_reminders(
        &self,
        window: ReminderWindow,
    ) -> Result<Vec<Appointment>, AppError>;

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError>;

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>, AppError>;

    /// The organization's current subscription, or `None` before any billing record exists.
    async fn find_subscription(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<SubscriptionSnapshot>, AppError>;

    async fn count_members(&self, organization_id: Uuid) -> Result<u32, AppError>;

    async fn count_services(&self, organization_id: Uuid) -> Result<u32, AppError>;

    /// Stamp the appointment as reminded. Setting it twice is harmless.
    async fn mark_reminder_sent(
        &self,
        appointment_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_count(count: i64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[async_trait]
impl BookingStore for PgStore {
    async fn find_eligible_reminders(
        &self,
        window: ReminderWindow,
    ) -> Result<Vec<Appointment>, AppError> {
        let statuses: Vec<String> = AppointmentStatus::REMINDABLE
            .iter()
            .map(|s| s.to_string())
            .collect();

        let appointments: Vec<Appointment> = sqlx::query_as(
            r#"
            SELECT id, organization_id, service_id, customer_name, customer_phone,
                   customer_email, start_datetime, status, management_token, reminder_sent_at
            FROM appointments
            WHERE status = ANY($1)
              AND start_datetime >= $2
              AND start_datetime < $3
              AND reminder_sent_at IS NULL
            ORDER BY start_datetime
            "#,
        )
        .bind(&statuses)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let org = sqlx::query_as(
            "SELECT id, name, slug, timezone, locale, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(org)
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        let service = sqlx::query_as(
            "SELECT id, organization_id, name, duration_minutes, active FROM services WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    async fn find_subscription(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<SubscriptionSnapshot>, AppError> {
        let snapshot = sqlx::query_as(
            r#"
            SELECT price_id, status
            FROM subscriptions
            WHERE organization_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    async fn count_members(&self, organization_id: Uuid) -> Result<u32, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM organization_members WHERE organization_id = $1")
                .bind(organization_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(to_count(count))
    }

    async fn count_services(&self, organization_id: Uuid) -> Result<u32, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM services WHERE organization_id = $1 AND active = true",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(to_count(count))
    }

    async fn mark_reminder_sent(
        &self,
        appointment_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE appointments SET reminder_sent_at = $2 WHERE id = $1 AND reminder_sent_at IS NULL",
        )
        .bind(appointment_id)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
