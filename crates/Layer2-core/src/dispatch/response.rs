//! ToolResponse - 모든 도구 호출의 공통 응답

use armory_foundation::Error;
use serde::{Deserialize, Serialize};

/// 도구 호출 결과 envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub is_error: bool,

    /// 에러 종류 태그 (`Error::kind()`), 성공이면 없음
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub text: String,
}

impl ToolResponse {
    /// 성공 응답
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            kind: None,
            text: text.into(),
        }
    }

    /// 에러 응답 - `Pending`은 에러가 아닌 것으로 표시
    pub fn from_error(err: &Error) -> Self {
        Self {
            is_error: !err.is_pending(),
            kind: Some(err.kind().to_string()),
            text: err.to_string(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.kind.as_deref() == Some("pending")
    }
}

impl From<armory_foundation::Result<String>> for ToolResponse {
    fn from(result: armory_foundation::Result<String>) -> Self {
        match result {
            Ok(text) => Self::success(text),
            Err(err) => Self::from_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let response = ToolResponse::success("[]");
        assert!(!response.is_error);
        assert_eq!(response.kind, None);
        assert_eq!(serde_json::to_value(&response).unwrap()["text"], "[]");
    }

    #[test]
    fn test_build_failure_carries_diagnostic() {
        let response = ToolResponse::from_error(&Error::build_failure("bad", "syntax error"));
        assert!(response.is_error);
        assert_eq!(response.kind.as_deref(), Some("build_failure"));
        assert!(response.text.contains("syntax error"));
    }

    #[test]
    fn test_pending_is_not_an_error() {
        let response = ToolResponse::from(Err::<String, _>(Error::Pending("T42".to_string())));
        assert!(!response.is_error);
        assert!(response.is_pending());
        assert!(response.text.contains("T42"));

        let unknown = ToolResponse::from_error(&Error::UnknownTask("T42".to_string()));
        assert!(unknown.is_error);
        assert!(!unknown.is_pending());
    }
}
