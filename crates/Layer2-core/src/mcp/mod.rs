//! MCP (Model Context Protocol) 프론트엔드
//!
//! Dispatcher를 stdio JSON-RPC 서버로 노출합니다.
//!
//! ## 지원 메서드
//! - `initialize` / `notifications/initialized` / `ping`
//! - `tools/list` - ToolSchemaRegistry의 도구 목록
//! - `tools/call` - Dispatcher 호출, `ToolResponse`를 `content[]` + `isError`로 변환
//!
//! ## 사용법
//!
//! ```ignore
//! let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
//! Arc::new(McpServer::new(dispatcher)).serve_stdio().await?;
//! ```

mod server;
mod types;

pub use server::McpServer;
pub use types::{
    JsonRpcError, JsonRpcMessage, JsonRpcResponse, McpContent, McpToolCall, McpToolResult,
    MCP_PROTOCOL_VERSION, MCP_SERVER_NAME,
};
