//! Outbound customer notifications.
//!
//! Picks a channel per recipient and plan, renders the channel payload and
//! delivers it through the configured chat (WhatsApp) or email (Resend) provider.

pub mod channel;
pub mod dispatcher;
pub mod email;
pub mod error;
pub mod provider;
pub mod template;
pub mod whatsapp;

pub use channel::ChannelResolver;
pub use dispatcher::{DispatchOutcome, DispatchReport, NotificationDispatcher};
