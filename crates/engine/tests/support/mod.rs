//! In-memory fakes for the persistence and provider seams.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use slotwise_common::error::AppError;
use slotwise_common::plan::{PlanPolicyResolver, PriceIds};
use slotwise_common::types::{
    Appointment, AppointmentStatus, Organization, Service, SubscriptionSnapshot,
    SubscriptionStatus,
};
use slotwise_engine::links::LinkBuilder;
use slotwise_engine::reminder::ReminderBatchJob;
use slotwise_engine::{BookingStore, ReminderWindow, ResourceLimitGuard};
use slotwise_notifier::NotificationDispatcher;
use slotwise_notifier::error::NotifierError;
use slotwise_notifier::provider::{
    AppointmentEmail, ChatProvider, ChatReceipt, EmailProvider, RescheduleEmail, TemplateMessage,
};

pub const PRICE_ESSENTIAL: &str = "price_essential_monthly";
pub const PRICE_PROFESSIONAL: &str = "price_professional_monthly";

#[derive(Default)]
pub struct MemoryStore {
    pub appointments: Mutex<Vec<Appointment>>,
    pub organizations: Mutex<HashMap<Uuid, Organization>>,
    pub services: Mutex<HashMap<Uuid, Service>>,
    pub subscriptions: Mutex<HashMap<Uuid, SubscriptionSnapshot>>,
    pub members: Mutex<HashMap<Uuid, u32>>,
    pub fail_eligibility: AtomicBool,
}

impl MemoryStore {
    pub fn add_organization(&self, slug: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.organizations.lock().unwrap().insert(
            id,
            Organization {
                id,
                name: format!("Org {}", slug),
                slug: slug.to_string(),
                timezone: "America/Sao_Paulo".to_string(),
                locale: "pt-BR".to_string(),
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn add_service(&self, organization_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.services.lock().unwrap().insert(
            id,
            Service {
                id,
                organization_id,
                name: name.to_string(),
                duration_minutes: 30,
                active: true,
            },
        );
        id
    }

    pub fn set_subscription(&self, organization_id: Uuid, price_id: Option<&str>, status: SubscriptionStatus) {
        self.subscriptions.lock().unwrap().insert(
            organization_id,
            SubscriptionSnapshot {
                price_id: price_id.map(str::to_string),
                status,
            },
        );
    }

    pub fn set_members(&self, organization_id: Uuid, count: u32) {
        self.members.lock().unwrap().insert(organization_id, count);
    }

    pub fn add_appointment(
        &self,
        organization_id: Uuid,
        service_id: Uuid,
        start: DateTime<Utc>,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.appointments.lock().unwrap().push(Appointment {
            id,
            organization_id,
            service_id,
            customer_name: "Ana".to_string(),
            customer_phone: phone.map(str::to_string),
            customer_email: email.map(str::to_string),
            start_datetime: start,
            status: AppointmentStatus::Confirmed,
            management_token: format!("tok-{}", id.simple()),
            reminder_sent_at: None,
        });
        id
    }

    pub fn update_appointment(&self, id: Uuid, f: impl FnOnce(&mut Appointment)) {
        let mut appointments = self.appointments.lock().unwrap();
        if let Some(appointment) = appointments.iter_mut().find(|a| a.id == id) {
            f(appointment);
        }
    }

    pub fn reminder_sent_at(&self, id: Uuid) -> Option<DateTime<Utc>> {
        self.appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .and_then(|a| a.reminder_sent_at)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_eligible_reminders(
        &self,
        window: ReminderWindow,
    ) -> Result<Vec<Appointment>, AppError> {
        if self.fail_eligibility.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection refused".to_string()));
        }

        let mut eligible: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.status.is_remindable()
                    && window.contains(a.start_datetime)
                    && a.reminder_sent_at.is_none()
            })
            .cloned()
            .collect();
        eligible.sort_by_key(|a| a.start_datetime);
        Ok(eligible)
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        Ok(self.organizations.lock().unwrap().get(&id).cloned())
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        Ok(self.services.lock().unwrap().get(&id).cloned())
    }

    async fn find_subscription(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<SubscriptionSnapshot>, AppError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .get(&organization_id)
            .cloned())
    }

    async fn count_members(&self, organization_id: Uuid) -> Result<u32, AppError> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&organization_id)
            .copied()
            .unwrap_or(0))
    }

    async fn count_services(&self, organization_id: Uuid) -> Result<u32, AppError> {
        Ok(self
            .services
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.organization_id == organization_id && s.active)
            .count() as u32)
    }

    async fn mark_reminder_sent(
        &self,
        appointment_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.update_appointment(appointment_id, |a| {
            a.reminder_sent_at.get_or_insert(sent_at);
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingChat {
    pub sent: Mutex<Vec<TemplateMessage>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ChatProvider for RecordingChat {
    fn name(&self) -> &str {
        "recording-chat"
    }

    async fn send_template(&self, message: &TemplateMessage) -> Result<ChatReceipt, NotifierError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifierError::Provider {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(ChatReceipt {
            message_id: format!("wamid.{}", Uuid::new_v4().simple()),
            success: true,
        })
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    pub reminders: Mutex<Vec<AppointmentEmail>>,
}

#[async_trait]
impl EmailProvider for RecordingEmail {
    fn name(&self) -> &str {
        "recording-email"
    }

    async fn send_confirmation(&self, _email: &AppointmentEmail) -> Result<(), NotifierError> {
        Ok(())
    }

    async fn send_cancellation(&self, _email: &AppointmentEmail) -> Result<(), NotifierError> {
        Ok(())
    }

    async fn send_reschedule(&self, _email: &RescheduleEmail) -> Result<(), NotifierError> {
        Ok(())
    }

    async fn send_reminder(&self, email: &AppointmentEmail) -> Result<(), NotifierError> {
        self.reminders.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn plans() -> Arc<PlanPolicyResolver> {
    Arc::new(PlanPolicyResolver::new(&PriceIds {
        essential_monthly: Some(PRICE_ESSENTIAL.to_string()),
        essential_yearly: Some("price_essential_yearly".to_string()),
        professional_monthly: Some(PRICE_PROFESSIONAL.to_string()),
        professional_yearly: Some("price_professional_yearly".to_string()),
    }))
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub chat: Arc<RecordingChat>,
    pub email: Arc<RecordingEmail>,
    pub job: ReminderBatchJob,
    pub guard: ResourceLimitGuard,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let chat = Arc::new(RecordingChat::default());
        let email = Arc::new(RecordingEmail::default());
        let dispatcher = Arc::new(NotificationDispatcher::new(chat.clone(), email.clone()));
        let plans = plans();

        let job = ReminderBatchJob::new(
            store.clone(),
            dispatcher,
            plans.clone(),
            LinkBuilder::new("https://app.slotwise.io"),
        );
        let guard = ResourceLimitGuard::new(store.clone(), plans);

        Self {
            store,
            chat,
            email,
            job,
            guard,
        }
    }
}

/// A start time comfortably inside the reminder window for `now`.
pub fn due_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(24)
}

/// Collects JSON-formatted log lines emitted on the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl LogCapture {
    /// Route this thread's events into a fresh capture until the guard drops.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(capture.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn events(&self) -> Vec<serde_json::Value> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Events whose `action` field equals `action`.
    pub fn with_action(&self, action: &str) -> Vec<serde_json::Value> {
        self.events()
            .into_iter()
            .filter(|e| e["fields"]["action"] == action)
            .collect()
    }
}
