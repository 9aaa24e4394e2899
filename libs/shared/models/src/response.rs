use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Uniform JSON envelope returned by every route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            count: None,
            error: None,
            details: None,
        }
    }

    pub fn data<T: Serialize>(data: T) -> Result<Self, AppError> {
        let data = serde_json::to_value(data)
            .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))?;

        Ok(Self {
            data: Some(data),
            ..Self::ok()
        })
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::ok()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
