//! Transactional email via the Resend HTTP API.
//!
//! Bodies are plain text; layout and branding live with the sender's
//! account defaults.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::NotifierError;
use crate::provider::{AppointmentEmail, EmailProvider, RescheduleEmail};
use crate::template::Locale;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
}

pub struct ResendClient {
    api_key: String,
    from: String,
    endpoint: String,
    client: reqwest::Client,
}

impl ResendClient {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from: from.into(),
            endpoint: RESEND_API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn deliver(&self, to: &str, subject: String, text: String) -> Result<(), NotifierError> {
        let email = OutgoingEmail {
            from: &self.from,
            to: [to],
            subject,
            text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Provider { status, body });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Confirmation,
    Cancellation,
    Reminder,
}

fn subject(kind: Kind, locale: Locale, organization: &str) -> String {
    let prefix = match (kind, locale) {
        (Kind::Confirmation, Locale::PtBr) => "Agendamento confirmado",
        (Kind::Confirmation, Locale::En) => "Appointment confirmed",
        (Kind::Cancellation, Locale::PtBr) => "Agendamento cancelado",
        (Kind::Cancellation, Locale::En) => "Appointment cancelled",
        (Kind::Reminder, Locale::PtBr) => "Lembrete do seu agendamento",
        (Kind::Reminder, Locale::En) => "Appointment reminder",
    };
    format!("{} - {}", prefix, organization)
}

fn links_text(locale: Locale, reschedule_url: Option<&str>, cancel_url: Option<&str>) -> String {
    let (reschedule, cancel) = match locale {
        Locale::PtBr => ("Reagendar", "Cancelar"),
        Locale::En => ("Reschedule", "Cancel"),
    };

    let mut text = String::new();
    if let Some(url) = reschedule_url {
        text.push_str(&format!("\n{}: {}", reschedule, url));
    }
    if let Some(url) = cancel_url {
        text.push_str(&format!("\n{}: {}", cancel, url));
    }
    text
}

fn appointment_text(kind: Kind, email: &AppointmentEmail) -> String {
    let lead = match (kind, email.locale) {
        (Kind::Confirmation, Locale::PtBr) => "seu agendamento está confirmado.",
        (Kind::Confirmation, Locale::En) => "your appointment is confirmed.",
        (Kind::Cancellation, Locale::PtBr) => "seu agendamento foi cancelado.",
        (Kind::Cancellation, Locale::En) => "your appointment was cancelled.",
        (Kind::Reminder, Locale::PtBr) => "lembrete: você tem um agendamento amanhã.",
        (Kind::Reminder, Locale::En) => "reminder: you have an appointment tomorrow.",
    };
    let at = match email.locale {
        Locale::PtBr => "às",
        Locale::En => "at",
    };

    format!(
        "{}, {}\n\n{} - {}\n{} {} {}\n{}",
        email.customer_name,
        lead,
        email.organization_name,
        email.service_name,
        email.date,
        at,
        email.time,
        links_text(
            email.locale,
            email.reschedule_url.as_deref(),
            email.cancel_url.as_deref()
        )
    )
}

fn reschedule_text(email: &RescheduleEmail) -> (String, String) {
    let (subject, lead, from, to) = match email.locale {
        Locale::PtBr => (
            "Agendamento reagendado",
            "seu agendamento foi reagendado.",
            "De",
            "Para",
        ),
        Locale::En => (
            "Appointment rescheduled",
            "your appointment was rescheduled.",
            "From",
            "To",
        ),
    };

    let text = format!(
        "{}, {}\n\n{} - {}\n{}: {} {}\n{}: {} {}\n{}",
        email.customer_name,
        lead,
        email.organization_name,
        email.service_name,
        from,
        email.old_date,
        email.old_time,
        to,
        email.new_date,
        email.new_time,
        links_text(
            email.locale,
            email.reschedule_url.as_deref(),
            email.cancel_url.as_deref()
        )
    );

    (format!("{} - {}", subject, email.organization_name), text)
}

#[async_trait]
impl EmailProvider for ResendClient {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send_confirmation(&self, email: &AppointmentEmail) -> Result<(), NotifierError> {
        let kind = Kind::Confirmation;
        self.deliver(
            &email.to,
            subject(kind, email.locale, &email.organization_name),
            appointment_text(kind, email),
        )
        .await
    }

    async fn send_cancellation(&self, email: &AppointmentEmail) -> Result<(), NotifierError> {
        let kind = Kind::Cancellation;
        self.deliver(
            &email.to,
            subject(kind, email.locale, &email.organization_name),
            appointment_text(kind, email),
        )
        .await
    }

    async fn send_reschedule(&self, email: &RescheduleEmail) -> Result<(), NotifierError> {
        let (subject, text) = reschedule_text(email);
        self.deliver(&email.to, subject, text).await
    }

    async fn send_reminder(&self, email: &AppointmentEmail) -> Result<(), NotifierError> {
        let kind = Kind::Reminder;
        self.deliver(
            &email.to,
            subject(kind, email.locale, &email.organization_name),
            appointment_text(kind, email),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::task::JoinHandle;

    fn header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    fn request_complete(buf: &[u8]) -> bool {
        let Some(end) = header_end(buf) else {
            return false;
        };
        let headers = String::from_utf8_lossy(&buf[..end]);
        let length = headers
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        buf.len() >= end + 4 + length
    }

    /// Answer a single HTTP request with `status` and `body`; the handle
    /// yields the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Vec<u8>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/emails", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request_complete(&request) {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            request
        });

        (endpoint, handle)
    }

    fn email(locale: Locale) -> AppointmentEmail {
        AppointmentEmail {
            to: "ana@example.com".to_string(),
            locale,
            customer_name: "Ana".to_string(),
            organization_name: "Studio Bela".to_string(),
            service_name: "Corte".to_string(),
            date: "20/10/2026".to_string(),
            time: "14:30".to_string(),
            cancel_url: Some("https://app.example.com/studio-bela/booking/tok/cancel".to_string()),
            reschedule_url: None,
        }
    }

    #[test]
    fn test_subject_is_localized() {
        assert_eq!(
            subject(Kind::Reminder, Locale::PtBr, "Studio Bela"),
            "Lembrete do seu agendamento - Studio Bela"
        );
        assert_eq!(
            subject(Kind::Confirmation, Locale::En, "Studio Bela"),
            "Appointment confirmed - Studio Bela"
        );
    }

    #[test]
    fn test_appointment_text_includes_details_and_links() {
        let text = appointment_text(Kind::Reminder, &email(Locale::PtBr));
        assert!(text.starts_with("Ana, lembrete"));
        assert!(text.contains("20/10/2026 às 14:30"));
        assert!(text.contains("Cancelar: https://app.example.com/studio-bela/booking/tok/cancel"));
        assert!(!text.contains("Reagendar"));
    }

    #[test]
    fn test_reschedule_text() {
        let email = RescheduleEmail {
            to: "ana@example.com".to_string(),
            locale: Locale::En,
            customer_name: "Ana".to_string(),
            organization_name: "Studio Bela".to_string(),
            service_name: "Corte".to_string(),
            old_date: "10/20/2026".to_string(),
            old_time: "14:30".to_string(),
            new_date: "10/21/2026".to_string(),
            new_time: "09:00".to_string(),
            cancel_url: None,
            reschedule_url: None,
        };
        let (subject, text) = reschedule_text(&email);
        assert_eq!(subject, "Appointment rescheduled - Studio Bela");
        assert!(text.contains("From: 10/20/2026 14:30"));
        assert!(text.contains("To: 10/21/2026 09:00"));
    }

    #[tokio::test]
    async fn test_reminder_is_posted_to_resend() {
        let (endpoint, server) = serve_once("200 OK", r#"{"id":"re_1"}"#).await;
        let client = ResendClient::new("re_test_key", "Slotwise <no-reply@slotwise.io>")
            .with_endpoint(endpoint);

        client.send_reminder(&email(Locale::PtBr)).await.unwrap();

        let request = server.await.unwrap();
        let end = header_end(&request).unwrap();
        let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
        assert!(head.starts_with("post /emails http/1.1"));
        assert!(head.contains("authorization: bearer re_test_key"));

        let body: serde_json::Value = serde_json::from_slice(&request[end + 4..]).unwrap();
        assert_eq!(body["from"], "Slotwise <no-reply@slotwise.io>");
        assert_eq!(body["to"], serde_json::json!(["ana@example.com"]));
        assert_eq!(body["subject"], "Lembrete do seu agendamento - Studio Bela");
        assert!(body["text"].as_str().unwrap().contains("20/10/2026 às 14:30"));
    }

    #[tokio::test]
    async fn test_rejected_email_returns_provider_error() {
        let (endpoint, server) =
            serve_once("422 Unprocessable Entity", r#"{"message":"invalid `to` field"}"#).await;
        let client = ResendClient::new("re_test_key", "no-reply@slotwise.io").with_endpoint(endpoint);

        let err = client
            .send_confirmation(&email(Locale::En))
            .await
            .unwrap_err();
        server.await.unwrap();

        match err {
            NotifierError::Provider { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("invalid `to` field"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
