//! Channel selection.
//!
//! Email is always available, so every input degrades to it rather than
//! failing: chat is chosen only for a non-empty phone on a chat-entitled plan.

use slotwise_common::plan::PlanTier;
use slotwise_common::types::{Channel, PlanType};

pub struct ChannelResolver;

impl ChannelResolver {
    /// Pick the channel for a recipient. Total over all inputs.
    ///
    /// `plan_type` is the plan name carried on the request; unknown names
    /// have no chat entitlement.
    pub fn resolve(recipient_phone: Option<&str>, plan_type: &str) -> Channel {
        let has_phone = recipient_phone.is_some_and(|p| !p.trim().is_empty());
        if !has_phone {
            return Channel::Email;
        }

        let chat_allowed = plan_type
            .parse::<PlanType>()
            .map(|plan| PlanTier::for_plan(plan).channels.chat)
            .unwrap_or(false);

        if chat_allowed {
            Channel::Chat
        } else {
            Channel::Email
        }
    }
}
