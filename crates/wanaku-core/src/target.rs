use serde::{Deserialize, Serialize};

use crate::service_type::ServiceType;

/// Identity and network location of a capability service as announced to
/// the discovery registry.
///
/// `id` stays empty until the registry assigns one; it is the only field
/// that changes after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub service_name: String,
    pub host: String,
    pub port: u16,
    pub service_type: ServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_sub_type: Option<String>,
}

impl ServiceTarget {
    pub fn new(
        service_name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        service_type: ServiceType,
    ) -> Self {
        Self {
            id: None,
            service_name: service_name.into(),
            host: host.into(),
            port,
            service_type,
            service_sub_type: None,
            language_name: None,
            language_type: None,
            language_sub_type: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.service_sub_type = Some(sub_type.into());
        self
    }

    pub fn with_language(
        mut self,
        name: impl Into<String>,
        language_type: Option<String>,
        sub_type: Option<String>,
    ) -> Self {
        self.language_name = Some(name.into());
        self.language_type = language_type;
        self.language_sub_type = sub_type;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// `host:port` as the router would dial it.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
