//! Plan-based resource limits.
//!
//! Advisory gate consulted by the member/service creation flows before they
//! insert. Uses the same essential-tier fallback as the reminder job, and logs
//! every denial and every fallback for auditing.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use slotwise_common::error::AppError;
use slotwise_common::plan::{PlanPolicyResolver, PlanTier};
use slotwise_common::types::PlanType;

use crate::store::BookingStore;

/// A plan-limited resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Member,
    Service,
}

impl ResourceKind {
    fn limit(&self, tier: &PlanTier) -> Option<u32> {
        match self {
            ResourceKind::Member => tier.max_members,
            ResourceKind::Service => tier.max_services,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Member => write!(f, "member"),
            ResourceKind::Service => write!(f, "service"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" | "members" => Ok(ResourceKind::Member),
            "service" | "services" => Ok(ResourceKind::Service),
            other => Err(AppError::Validation(format!(
                "Invalid resource '{}'. Valid resources: members, services",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NoSubscription,
    LimitExceeded,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::NoSubscription => write!(f, "no_subscription"),
            DenyReason::LimitExceeded => write!(f, "limit_exceeded"),
        }
    }
}

/// Result of a limit check. `limit: None` with a plan means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<PlanType>,
}

pub struct ResourceLimitGuard {
    store: Arc<dyn BookingStore>,
    plans: Arc<PlanPolicyResolver>,
}

impl ResourceLimitGuard {
    pub fn new(store: Arc<dyn BookingStore>, plans: Arc<PlanPolicyResolver>) -> Self {
        Self { store, plans }
    }

    /// Can `organization_id` add one more member?
    pub async fn check_member_limit(&self, organization_id: Uuid) -> Result<LimitDecision, AppError> {
        self.check(organization_id, ResourceKind::Member).await
    }

    /// Can `organization_id` add one more active service?
    pub async fn check_service_limit(&self, organization_id: Uuid) -> Result<LimitDecision, AppError> {
        self.check(organization_id, ResourceKind::Service).await
    }

    pub async fn check(
        &self,
        organization_id: Uuid,
        resource: ResourceKind,
    ) -> Result<LimitDecision, AppError> {
        let snapshot = self.store.find_subscription(organization_id).await?;
        let current = match resource {
            ResourceKind::Member => self.store.count_members(organization_id).await?,
            ResourceKind::Service => self.store.count_services(organization_id).await?,
        };

        let Some(snapshot) = snapshot else {
            // Bootstrap: the owner joins before any billing record exists.
            if current == 0 {
                tracing::info!(
                    organization_id = %organization_id,
                    resource = %resource,
                    action = "allow_bootstrap",
                    "No subscription yet, allowing first resource"
                );
                return Ok(LimitDecision {
                    allowed: true,
                    reason: None,
                    current: Some(current),
                    limit: None,
                    plan_type: None,
                });
            }

            tracing::warn!(
                organization_id = %organization_id,
                resource = %resource,
                reason = %DenyReason::NoSubscription,
                current,
                action = "deny",
                "Resource limit check denied"
            );
            return Ok(LimitDecision {
                allowed: false,
                reason: Some(DenyReason::NoSubscription),
                current: Some(current),
                limit: None,
                plan_type: None,
            });
        };

        let (tier, fallback_applied) = self.plans.resolve_or_essential(&snapshot);
        if fallback_applied {
            tracing::warn!(
                organization_id = %organization_id,
                resource = %resource,
                price_id = snapshot.price_id.as_deref().unwrap_or("none"),
                status = %snapshot.status,
                action = "fallback_essential",
                "Unresolved subscription price, applying essential tier limits"
            );
        } else {
            tracing::debug!(
                organization_id = %organization_id,
                resource = %resource,
                plan = %tier.plan,
                "Plan resolved for limit check"
            );
        }

        let limit = resource.limit(&tier);
        let within_limit = limit.is_none_or(|max| current < max);

        if !within_limit {
            tracing::warn!(
                organization_id = %organization_id,
                resource = %resource,
                reason = %DenyReason::LimitExceeded,
                current,
                limit,
                plan = %tier.plan,
                fallback_applied,
                action = "deny",
                "Resource limit check denied"
            );
        }

        Ok(LimitDecision {
            allowed: within_limit,
            reason: (!within_limit).then_some(DenyReason::LimitExceeded),
            current: Some(current),
            limit,
            plan_type: Some(tier.plan),
        })
    }
}
