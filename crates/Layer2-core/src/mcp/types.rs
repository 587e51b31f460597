//! MCP Types - JSON-RPC 2.0 + MCP 메시지 타입

use crate::dispatch::ToolResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 지원하는 MCP 프로토콜 버전
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// initialize 응답의 서버 이름
pub const MCP_SERVER_NAME: &str = "armory";

/// 수신 메시지 (요청 또는 알림)
///
/// id는 숫자/문자열 모두 가능하고, 없으면 알림입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    #[serde(default)]
    pub jsonrpc: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcMessage {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,

    /// 파싱 실패처럼 id를 알 수 없으면 `null`
    pub id: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 에러
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: "Parse error".to_string(),
            data: Some(Value::String(detail.into())),
        }
    }

    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "Invalid Request".to_string(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: msg.into(),
            data: None,
        }
    }
}

/// `tools/call` 파라미터
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolCall {
    pub name: String,

    #[serde(default)]
    pub arguments: Value,
}

/// MCP 콘텐츠
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpContent {
    Text { text: String },
}

/// `tools/call` 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolResult {
    pub content: Vec<McpContent>,

    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl McpToolResult {
    /// 텍스트 결과 추출
    pub fn text(&self) -> Option<&str> {
        self.content.first().map(|content| match content {
            McpContent::Text { text } => text.as_str(),
        })
    }
}

impl From<ToolResponse> for McpToolResult {
    fn from(response: ToolResponse) -> Self {
        Self {
            content: vec![McpContent::Text {
                text: response.text,
            }],
            is_error: response.is_error,
        }
    }
}
