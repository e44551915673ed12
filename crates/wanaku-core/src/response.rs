use serde::{Deserialize, Serialize};

/// Error payload carried inside a registry response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
}

/// Envelope wrapping every discovery API reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WanakuResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl<T> WanakuResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ResponseError {
                message: message.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Assigned {
        id: String,
    }

    #[test]
    fn missing_fields_decode_as_none() {
        let reply: WanakuResponse<Assigned> = serde_json::from_str(r#"{"data":{"id":"a"}}"#).unwrap();
        assert_eq!(reply.data, Some(Assigned { id: "a".to_string() }));
        assert!(reply.error.is_none());

        let empty: WanakuResponse<Assigned> = serde_json::from_str("{}").unwrap();
        assert!(empty.data.is_none() && empty.error.is_none());
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let body = serde_json::to_string(&WanakuResponse::<u8>::err("nope")).unwrap();
        assert_eq!(body, r#"{"error":{"message":"nope"}}"#);
    }
}
