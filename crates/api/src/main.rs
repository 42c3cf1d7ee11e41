//! Slotwise API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use slotwise_common::config::AppConfig;
use slotwise_common::db::create_pool;
use slotwise_common::plan::PlanPolicyResolver;
use slotwise_engine::links::LinkBuilder;
use slotwise_engine::{PgStore, ReminderBatchJob, ResourceLimitGuard};
use slotwise_notifier::NotificationDispatcher;
use slotwise_notifier::email::ResendClient;
use slotwise_notifier::provider::{ChatProvider, EmailProvider, UnconfiguredProvider};
use slotwise_notifier::whatsapp::{WhatsAppClient, WhatsAppConfig};

use slotwise_api::jobs::start_reminder_clock;
use slotwise_api::routes::create_router;
use slotwise_api::state::AppState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "slotwise_api=debug,slotwise_engine=debug,slotwise_notifier=debug,tower_http=debug",
        )
    });

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn chat_provider(config: &AppConfig) -> Arc<dyn ChatProvider> {
    match (&config.whatsapp_access_token, &config.whatsapp_phone_number_id) {
        (Some(access_token), Some(phone_number_id)) => Arc::new(WhatsAppClient::new(WhatsAppConfig {
            access_token: access_token.clone(),
            phone_number_id: phone_number_id.clone(),
            api_version: config.whatsapp_api_version.clone(),
        })),
        _ => {
            tracing::warn!("WhatsApp credentials not set, chat notifications will fail");
            Arc::new(UnconfiguredProvider::new("whatsapp"))
        }
    }
}

fn email_provider(config: &AppConfig) -> Arc<dyn EmailProvider> {
    match (&config.resend_api_key, &config.email_from) {
        (Some(api_key), Some(from)) => Arc::new(ResendClient::new(api_key.clone(), from.clone())),
        _ => {
            tracing::warn!("RESEND_API_KEY or EMAIL_FROM not set, email notifications will fail");
            Arc::new(UnconfiguredProvider::new("resend"))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Slotwise API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    let store = Arc::new(PgStore::new(pool));
    let plans = Arc::new(PlanPolicyResolver::new(&config.price_ids));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        chat_provider(&config),
        email_provider(&config),
    ));

    let reminders = Arc::new(ReminderBatchJob::new(
        store.clone(),
        dispatcher,
        plans.clone(),
        LinkBuilder::new(&config.app_base_url),
    ));
    let limits = Arc::new(ResourceLimitGuard::new(store, plans));

    if config.reminder_scheduler_enabled {
        start_reminder_clock(reminders.clone(), config.reminder_interval_secs);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));

    // Build application state
    let state = AppState::new(config, reminders, limits);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
