//! Channel provider seams.
//!
//! Providers are constructed once at startup and handed to the dispatcher;
//! tests substitute recording fakes.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::NotifierError;
use crate::template::Locale;

/// One template parameter. Only text parameters are used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateParameter {
    Text { text: String },
}

impl TemplateParameter {
    pub fn text(value: impl Into<String>) -> Self {
        TemplateParameter::Text { text: value.into() }
    }
}

/// A component of a chat template message, in the order the template declares them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateComponent {
    Body {
        parameters: Vec<TemplateParameter>,
    },
    /// A dynamic URL button; the parameter is the suffix appended to the
    /// button's base URL registered with the template.
    Button {
        sub_type: String,
        index: String,
        parameters: Vec<TemplateParameter>,
    },
}

/// A templated chat message ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateMessage {
    pub to: String,
    pub template_name: String,
    pub language_code: String,
    pub components: Vec<TemplateComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReceipt {
    pub message_id: String,
    pub success: bool,
}

/// Fields shared by the confirmation, cancellation and reminder emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentEmail {
    pub to: String,
    pub locale: Locale,
    pub customer_name: String,
    pub organization_name: String,
    pub service_name: String,
    pub date: String,
    pub time: String,
    pub cancel_url: Option<String>,
    pub reschedule_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RescheduleEmail {
    pub to: String,
    pub locale: Locale,
    pub customer_name: String,
    pub organization_name: String,
    pub service_name: String,
    pub old_date: String,
    pub old_time: String,
    pub new_date: String,
    pub new_time: String,
    pub cancel_url: Option<String>,
    pub reschedule_url: Option<String>,
}

/// Templated chat-messaging sender.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn send_template(&self, message: &TemplateMessage) -> Result<ChatReceipt, NotifierError>;
}

/// Transactional email sender, one operation per event type.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn send_confirmation(&self, email: &AppointmentEmail) -> Result<(), NotifierError>;

    async fn send_cancellation(&self, email: &AppointmentEmail) -> Result<(), NotifierError>;

    async fn send_reschedule(&self, email: &RescheduleEmail) -> Result<(), NotifierError>;

    async fn send_reminder(&self, email: &AppointmentEmail) -> Result<(), NotifierError>;
}

/// Stand-in for a provider whose credentials are absent. Every send fails
/// with a configuration error, which the dispatcher logs like any other
/// provider failure.
pub struct UnconfiguredProvider {
    name: &'static str,
}

impl UnconfiguredProvider {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn error(&self) -> NotifierError {
        NotifierError::Config(format!("{} provider is not configured", self.name))
    }
}

#[async_trait]
impl ChatProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn send_template(&self, _message: &TemplateMessage) -> Result<ChatReceipt, NotifierError> {
        Err(self.error())
    }
}

#[async_trait]
impl EmailProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn send_confirmation(&self, _email: &AppointmentEmail) -> Result<(), NotifierError> {
        Err(self.error())
    }

    async fn send_cancellation(&self, _email: &AppointmentEmail) -> Result<(), NotifierError> {
        Err(self.error())
    }

    async fn send_reschedule(&self, _email: &RescheduleEmail) -> Result<(), NotifierError> {
        Err(self.error())
    }

    async fn send_reminder(&self, _email: &AppointmentEmail) -> Result<(), NotifierError> {
        Err(self.error())
    }
}
