//! Plan tiers and the subscription → plan policy.
//!
//! Tier entitlements are static. The only per-organization input is the
//! subscription snapshot, which callers read fresh for every decision.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{PlanType, SubscriptionSnapshot, SubscriptionStatus};

/// Which outbound channels a tier may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntitlements {
    pub email: bool,
    pub chat: bool,
}

/// Resource and channel limits for a plan tier. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTier {
    pub plan: PlanType,
    pub max_members: Option<u32>,
    pub max_services: Option<u32>,
    pub channels: ChannelEntitlements,
}

impl PlanTier {
    /// | Plan | Members | Services | Email | Chat |
    /// |------|---------|----------|-------|------|
    /// | Essential | 1 | 5 | Yes | No |
    /// | Professional | 5 | Unlimited | Yes | Yes |
    pub const fn for_plan(plan: PlanType) -> Self {
        match plan {
            PlanType::Essential => Self {
                plan,
                max_members: Some(1),
                max_services: Some(5),
                channels: ChannelEntitlements {
                    email: true,
                    chat: false,
                },
            },
            PlanType::Professional => Self {
                plan,
                max_members: Some(5),
                max_services: None,
                channels: ChannelEntitlements {
                    email: true,
                    chat: true,
                },
            },
        }
    }

    /// Tier used whenever a subscription cannot be mapped to a known plan.
    pub const fn fail_safe() -> Self {
        Self::for_plan(PlanType::Essential)
    }
}

/// A successfully resolved plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResolution {
    pub tier: PlanTier,
    pub source_price_id: Option<String>,
}

/// The four configured billing price identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceIds {
    pub essential_monthly: Option<String>,
    pub essential_yearly: Option<String>,
    pub professional_monthly: Option<String>,
    pub professional_yearly: Option<String>,
}

/// Maps subscription snapshots to plan tiers. Never guesses: ambiguous input
/// yields `None` and the caller decides what to do.
#[derive(Debug, Clone, Default)]
pub struct PlanPolicyResolver {
    prices: HashMap<String, PlanType>,
}

impl PlanPolicyResolver {
    pub fn new(price_ids: &PriceIds) -> Self {
        let entries = [
            (&price_ids.essential_monthly, PlanType::Essential),
            (&price_ids.essential_yearly, PlanType::Essential),
            (&price_ids.professional_monthly, PlanType::Professional),
            (&price_ids.professional_yearly, PlanType::Professional),
        ];

        let prices = entries
            .into_iter()
            .filter_map(|(id, plan)| {
                id.as_deref()
                    .filter(|id| !id.is_empty())
                    .map(|id| (id.to_string(), plan))
            })
            .collect();

        Self { prices }
    }

    /// Resolve a snapshot to its plan.
    ///
    /// Trialing subscriptions always get the professional tier, whatever their
    /// price. Otherwise the price must be one of the configured identifiers.
    pub fn resolve(&self, snapshot: &SubscriptionSnapshot) -> Option<PlanResolution> {
        if snapshot.status == SubscriptionStatus::Trialing {
            return Some(PlanResolution {
                tier: PlanTier::for_plan(PlanType::Professional),
                source_price_id: snapshot.price_id.clone(),
            });
        }

        let price_id = snapshot.price_id.as_deref()?;
        let plan = self.prices.get(price_id)?;

        Some(PlanResolution {
            tier: PlanTier::for_plan(*plan),
            source_price_id: Some(price_id.to_string()),
        })
    }

    /// Resolve, substituting the essential tier when the snapshot is unresolved.
    ///
    /// Returns `(tier, fallback_applied)`. Callers log the fallback with their
    /// own context; an unresolved price usually means a misconfigured catalog.
    pub fn resolve_or_essential(&self, snapshot: &SubscriptionSnapshot) -> (PlanTier, bool) {
        match self.resolve(snapshot) {
            Some(resolution) => (resolution.tier, false),
            None => (PlanTier::fail_safe(), true),
        }
    }
}
