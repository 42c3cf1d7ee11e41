//! Customer self-service links for cancel/reschedule.
//!
//! Email carries absolute URLs; chat URL buttons take only the path suffix,
//! since the base URL is fixed when the template is registered.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementLinks {
    pub cancel_url: String,
    pub reschedule_url: String,
    pub cancel_path: String,
    pub reschedule_path: String,
}

#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn for_appointment(&self, organization_slug: &str, management_token: &str) -> ManagementLinks {
        let cancel_path = format!("{}/booking/{}/cancel", organization_slug, management_token);
        let reschedule_path = format!("{}/booking/{}/reschedule", organization_slug, management_token);

        ManagementLinks {
            cancel_url: format!("{}/{}", self.base_url, cancel_path),
            reschedule_url: format!("{}/{}", self.base_url, reschedule_path),
            cancel_path,
            reschedule_path,
        }
    }
}
