//! Payload (de)serialization capability injected into the transport and the
//! registration manager.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::WanakuError;

pub trait Serializer: Send + Sync {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, WanakuError>;
}

pub trait Deserializer: Send + Sync {
    fn deserialize<T: DeserializeOwned>(&self, body: &str) -> Result<T, WanakuError>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Serializer for JsonCodec {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, WanakuError> {
        serde_json::to_string(value).map_err(|e| WanakuError::Serialization(e.to_string()))
    }
}

impl Deserializer for JsonCodec {
    fn deserialize<T: DeserializeOwned>(&self, body: &str) -> Result<T, WanakuError> {
        serde_json::from_str(body).map_err(|e| WanakuError::InvalidResponseData(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ServiceTarget, ServiceType, WanakuResponse};

    #[test]
    fn decodes_envelope_with_assigned_target() {
        let body = r#"{"data":{"id":"11111111-1111-1111-1111-111111111111","serviceName":"camel","host":"localhost","port":9190,"serviceType":"tool-invoker"}}"#;
        let reply: WanakuResponse<ServiceTarget> = JsonCodec.deserialize(body).unwrap();
        let target = reply.data.unwrap();
        assert_eq!(target.id(), Some("11111111-1111-1111-1111-111111111111"));
        assert_eq!(target.service_type, ServiceType::ToolInvoker);
        assert!(reply.error.is_none());
    }

    #[test]
    fn garbage_is_invalid_response_data() {
        let result: Result<WanakuResponse<ServiceTarget>, _> = JsonCodec.deserialize("<html>");
        assert!(matches!(result, Err(WanakuError::InvalidResponseData(_))));
    }

    #[test]
    fn error_envelope_decodes_without_data() {
        let reply: WanakuResponse<ServiceTarget> =
            JsonCodec.deserialize(r#"{"error":{"message":"nope"}}"#).unwrap();
        assert!(reply.data.is_none());
        assert_eq!(reply.error.unwrap().message, "nope");
    }
}
