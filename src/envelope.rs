//! Response shapes of the FlexBase REST API.
//!
//! Endpoints answer either with the bare value or wrapped in a
//! `{success, data}` / `{success, message}` envelope.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("{0}")]
    Rejected(String),
    #[error("Request failed without a message")]
    Failed,
    #[error("Response carries no data")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ApiPayload<T> {
    Wrapped {
        #[serde(default)]
        success: Option<bool>,
        data: T,
        #[serde(default)]
        message: Option<String>,
    },
    Status {
        success: bool,
        #[serde(default)]
        message: Option<String>,
    },
    /// Error body carrying only a message.
    Message { message: String },
    Bare(T),
}

impl<T> ApiPayload<T> {
    pub fn into_data(self) -> Result<T, EnvelopeError> {
        match self {
            Self::Wrapped {
                success: Some(false),
                message,
                ..
            }
            | Self::Status {
                success: false,
                message,
            } => Err(message.map(EnvelopeError::Rejected).unwrap_or(EnvelopeError::Failed)),
            Self::Message { message } => Err(EnvelopeError::Rejected(message)),
            Self::Wrapped { data, .. } => Ok(data),
            Self::Status { .. } => Err(EnvelopeError::Empty),
            Self::Bare(data) => Ok(data),
        }
    }

    /// Status message, when the server sent one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Wrapped { message, .. } | Self::Status { message, .. } => message.as_deref(),
            Self::Message { message } => Some(message.as_str()),
            Self::Bare(_) => None,
        }
    }
}

/// `Authorization` header for an authenticated request.
pub fn bearer_header(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Endpoint {
        id: i64,
        rota: String,
    }

    fn decode<T: serde::de::DeserializeOwned>(v: Value) -> ApiPayload<T> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_bare_array() {
        let payload: ApiPayload<Vec<Endpoint>> = decode(json!([{ "id": 1, "rota": "/users" }]));
        let data = payload.into_data().unwrap();
        assert_eq!(data[0].rota, "/users");
    }

    #[test]
    fn test_wrapped_data() {
        let payload: ApiPayload<Vec<Endpoint>> = decode(json!({
            "success": true,
            "data": [{ "id": 2, "rota": "/orders" }]
        }));
        assert_eq!(payload.into_data().unwrap()[0].id, 2);
    }

    #[test]
    fn test_wrapped_without_success() {
        let payload: ApiPayload<Vec<i64>> = decode(json!({ "data": [1, 2] }));
        assert_eq!(payload.into_data().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_rejected_with_message() {
        let payload: ApiPayload<Vec<Endpoint>> =
            decode(json!({ "success": false, "message": "Aplicação não encontrada" }));
        assert_eq!(payload.message(), Some("Aplicação não encontrada"));
        assert_eq!(
            payload.into_data(),
            Err(EnvelopeError::Rejected("Aplicação não encontrada".into()))
        );
    }

    #[test]
    fn test_message_only_body_is_rejected() {
        let payload: ApiPayload<Value> = decode(json!({ "message": "Erro ao salvar endpoint" }));
        assert_eq!(payload.message(), Some("Erro ao salvar endpoint"));
        assert_eq!(
            payload.into_data(),
            Err(EnvelopeError::Rejected("Erro ao salvar endpoint".into()))
        );
    }

    #[test]
    fn test_unwrap_keeps_bare_objects() {
        let payload: ApiPayload<Value> = decode(json!({ "id": 3, "nome": "loja" }));
        assert_eq!(payload.into_data(), Ok(json!({ "id": 3, "nome": "loja" })));
    }

    #[test]
    fn test_success_without_data() {
        let payload: ApiPayload<Vec<Endpoint>> = decode(json!({ "success": true }));
        assert_eq!(payload.into_data(), Err(EnvelopeError::Empty));
    }

    #[test]
    fn test_bare_object() {
        let payload: ApiPayload<Endpoint> = decode(json!({ "id": 5, "rota": "/keys" }));
        assert_eq!(
            payload.into_data().unwrap(),
            Endpoint {
                id: 5,
                rota: "/keys".into()
            }
        );
    }

    #[test]
    fn test_bearer_header() {
        assert_eq!(
            bearer_header("abc"),
            ("Authorization", "Bearer abc".to_string())
        );
    }
}
