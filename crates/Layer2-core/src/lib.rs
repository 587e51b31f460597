//! armory-core: Core Runtime for Armory
//!
//! Layer2 - 플러그인 등록 + 비동기 실행 브릿지
//!
//! # 주요 모듈
//!
//! - `tool`: Tool Schema Registry (호출 가능한 도구 선언 + 인자 검증)
//! - `build`: Build Invoker (외부 빌드 서브프로세스)
//! - `plugin`: Manifest Store + Registration Pipeline
//! - `remote`: C2 백엔드 HTTP 경계
//! - `task`: Async Task Bridge (submit/poll)
//! - `dispatch`: Dispatcher + 공통 응답 envelope
//! - `mcp`: MCP stdio 프론트엔드
//!
//! # 사용 예시
//!
//! ```ignore
//! use armory_core::{Dispatcher, McpServer};
//! use armory_foundation::BridgeConfig;
//!
//! let config = BridgeConfig::load()?;
//! let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
//!
//! // 직접 호출
//! let response = dispatcher.dispatch("list_plugins", json!({})).await;
//!
//! // MCP 서버
//! Arc::new(McpServer::new(dispatcher)).serve_stdio().await?;
//! ```

pub mod build;
pub mod dispatch;
pub mod mcp;
pub mod plugin;
pub mod remote;
pub mod task;
pub mod tool;

// Re-exports: Build
pub use build::{BuildInvoker, BuildResult, BuildStatus, CommandBuildInvoker};

// Re-exports: Dispatch
pub use dispatch::{Dispatcher, ToolResponse};

// Re-exports: MCP
pub use mcp::{McpServer, MCP_PROTOCOL_VERSION};

// Re-exports: Plugin
pub use plugin::{
    ManifestStore, ParamType, PluginCategory, PluginDescriptor, PluginKind, PluginParam,
    RegisterRequest, Registration, RegistrationPipeline, UpsertOutcome,
};

// Re-exports: Remote
pub use remote::{HttpBackend, Method, RemoteBackend, RemoteReply, RemoteRequest};

// Re-exports: Task
pub use task::{AsyncTask, TaskBridge, TaskLedger, TaskStatus};

// Re-exports: Tool
pub use tool::{OperationDescriptor, ToolSchemaRegistry};

// Re-exports from Layer1
pub use armory_foundation::{BridgeConfig, Error, Result};
