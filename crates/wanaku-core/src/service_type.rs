use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::WanakuError;

/// The kind of capability a service offers to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    ResourceProvider,
    ToolInvoker,
    MultiCapability,
    CodeExecutionEngine,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::ResourceProvider,
        ServiceType::ToolInvoker,
        ServiceType::MultiCapability,
        ServiceType::CodeExecutionEngine,
    ];

    /// Numeric code stored in the instance identity file header.
    pub fn code(&self) -> i32 {
        match self {
            ServiceType::ResourceProvider => 1,
            ServiceType::ToolInvoker => 2,
            ServiceType::MultiCapability => 3,
            ServiceType::CodeExecutionEngine => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ResourceProvider => "resource-provider",
            ServiceType::ToolInvoker => "tool-invoker",
            ServiceType::MultiCapability => "multi-capability",
            ServiceType::CodeExecutionEngine => "code-execution-engine",
        }
    }
}

impl TryFrom<i32> for ServiceType {
    type Error = WanakuError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ServiceType::ResourceProvider),
            2 => Ok(ServiceType::ToolInvoker),
            3 => Ok(ServiceType::MultiCapability),
            4 => Ok(ServiceType::CodeExecutionEngine),
            other => Err(WanakuError::InvalidArgument(format!(
                "invalid service type code: {other}"
            ))),
        }
    }
}

impl FromStr for ServiceType {
    type Err = WanakuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WanakuError::InvalidArgument(format!("invalid service type: {s}")))
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
