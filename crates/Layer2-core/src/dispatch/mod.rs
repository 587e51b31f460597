//! Dispatcher - 도구 이름 → 컴포넌트 라우팅
//!
//! 1. 이름 확인 (`UnknownOperation`이면 아무 컴포넌트도 호출하지 않음)
//! 2. 스키마 검증 (`Validation`)
//! 3. 라우팅
//!    - 백엔드 릴레이: get_clients, send_cmd, list_plugins, list_files,
//!      list_processes, get_history
//!    - RegistrationPipeline: register_wasm_plugin
//!    - TaskBridge: run_plugin, get_plugin_result
//! 4. 결과/에러를 `ToolResponse`로 감쌈
//!
//! 설정(백엔드 URL, 토큰)은 생성 시 명시적으로 전달됩니다.

mod response;

pub use response::ToolResponse;

use crate::build::CommandBuildInvoker;
use crate::plugin::{RegisterRequest, RegistrationPipeline};
use crate::remote::{HttpBackend, RemoteBackend, RemoteRequest};
use crate::task::{TaskBridge, TaskLedger};
use crate::tool::{OperationDescriptor, ToolSchemaRegistry};
use armory_foundation::strings::*;
use armory_foundation::{BridgeConfig, Error, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 도구 호출 디스패처
pub struct Dispatcher {
    registry: ToolSchemaRegistry,
    backend: Arc<dyn RemoteBackend>,
    tasks: TaskBridge,
    registration: RegistrationPipeline,
}

impl Dispatcher {
    /// 메모리 전용 task 기록으로 생성
    pub fn new(backend: Arc<dyn RemoteBackend>, registration: RegistrationPipeline) -> Result<Self> {
        let tasks = TaskBridge::new(Arc::clone(&backend));
        Self::with_tasks(backend, tasks, registration)
    }

    /// task 브릿지를 직접 지정해서 생성
    pub fn with_tasks(
        backend: Arc<dyn RemoteBackend>,
        tasks: TaskBridge,
        registration: RegistrationPipeline,
    ) -> Result<Self> {
        Ok(Self {
            registry: ToolSchemaRegistry::builtin()?,
            backend,
            tasks,
            registration,
        })
    }

    /// 설정에서 실제 HTTP 백엔드 + 서브프로세스 빌드로 생성
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;

        let backend: Arc<dyn RemoteBackend> = Arc::new(HttpBackend::new(&config.backend)?);
        let invoker = Arc::new(CommandBuildInvoker::from_config(&config.build));
        let registration = RegistrationPipeline::from_config(config, invoker);
        let tasks = TaskBridge::with_ledger(
            Arc::clone(&backend),
            TaskLedger::new(config.paths.tasks_path()),
        )?;

        info!(
            "Dispatcher ready (backend: {}, manifest: {:?})",
            config.backend.base_url,
            registration.store().path()
        );
        Self::with_tasks(backend, tasks, registration)
    }

    pub fn registry(&self) -> &ToolSchemaRegistry {
        &self.registry
    }

    pub fn tasks(&self) -> &TaskBridge {
        &self.tasks
    }

    pub fn registration(&self) -> &RegistrationPipeline {
        &self.registration
    }

    pub fn list_operations(&self) -> Vec<OperationDescriptor> {
        self.registry.list_operations()
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// 도구 호출 → 응답 envelope
    pub async fn dispatch(&self, name: &str, args: Value) -> ToolResponse {
        let response = ToolResponse::from(self.call(name, args).await);
        if response.is_error {
            warn!("Tool '{}' failed: {}", name, response.text);
        } else {
            debug!("Tool '{}' -> {} bytes", name, response.text.len());
        }
        response
    }

    /// 도구 호출 (검증 + 라우팅)
    pub async fn call(&self, name: &str, args: Value) -> Result<String> {
        self.registry.validate(name, &args)?;
        let args = if args.is_null() { json!({}) } else { args };
        info!("Dispatching '{}'", name);

        match name {
            TOOL_GET_CLIENTS => self.relay(RemoteRequest::get("api/clients")).await,
            TOOL_SEND_CMD => self.relay(RemoteRequest::post("api/cmd", args)).await,
            TOOL_LIST_PLUGINS => self.relay(RemoteRequest::get("api/plugins")).await,
            TOOL_LIST_FILES => {
                let request = RemoteRequest::get("api/files/list")
                    .query("uuid", str_arg(&args, "uuid"))
                    .query("path", str_arg(&args, "path"));
                self.relay(request).await
            }
            TOOL_LIST_PROCESSES => {
                let request =
                    RemoteRequest::get("api/processes/list").query("uuid", str_arg(&args, "uuid"));
                self.relay(request).await
            }
            TOOL_GET_HISTORY => {
                let request =
                    RemoteRequest::get("api/clients/history").segment(str_arg(&args, "uuid"));
                self.relay(request).await
            }
            TOOL_REGISTER_PLUGIN => {
                let request: RegisterRequest = serde_json::from_value(args).map_err(|e| {
                    Error::Validation(format!("Invalid arguments for '{}': {}", name, e))
                })?;
                self.register(request).await
            }
            TOOL_RUN_PLUGIN => {
                self.run_plugin(
                    str_arg(&args, "uuid"),
                    str_arg(&args, "plugin_id"),
                    str_arg(&args, "args"),
                )
                .await
            }
            TOOL_GET_PLUGIN_RESULT => self.plugin_result(str_arg(&args, "task_id")).await,
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }

    // ========================================================================
    // Typed entry points (direct-call front-end)
    // ========================================================================

    /// 플러그인 등록 → 등록된 디스크립터 JSON
    pub async fn register(&self, request: RegisterRequest) -> Result<String> {
        let registration = self.registration.register(request).await?;
        Ok(serde_json::to_string_pretty(&registration.descriptor)?)
    }

    /// 플러그인 실행 제출 → `{"task_id": ..}`
    pub async fn run_plugin(&self, endpoint_id: &str, plugin_id: &str, args: &str) -> Result<String> {
        let task_id = self.tasks.submit(endpoint_id, plugin_id, args).await?;
        Ok(json!({ "task_id": task_id }).to_string())
    }

    /// 플러그인 결과 조회
    pub async fn plugin_result(&self, task_id: &str) -> Result<String> {
        self.tasks.fetch_result(task_id).await
    }

    /// 백엔드 응답 본문을 그대로 전달 (2xx가 아니면 `Remote` 에러)
    async fn relay(&self, request: RemoteRequest) -> Result<String> {
        self.backend.send(request).await?.into_text()
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or("")
}

// ============================================================================
// 테스트
// ============================================================================
