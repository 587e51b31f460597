//! Direct-call 프론트엔드
//!
//! `call`만 스키마 검증을 거치고, 전용 서브커맨드는 타입이 있는
//! 요청을 바로 만들어 Dispatcher의 typed 진입점을 호출합니다.

use crate::Command;
use armory_core::{
    Dispatcher, McpServer, ParamType, PluginParam, RegisterRequest, ToolResponse,
};
use armory_foundation::BridgeConfig;
use serde_json::Value;
use std::process::ExitCode;
use std::sync::Arc;

/// 서브커맨드 실행
pub async fn run(command: Command, config: &BridgeConfig) -> anyhow::Result<ExitCode> {
    let dispatcher = Arc::new(Dispatcher::from_config(config)?);

    let response = match command {
        Command::Serve => {
            Arc::new(McpServer::new(dispatcher)).serve_stdio().await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Tools => {
            for op in dispatcher.list_operations() {
                let required = op.required_fields().join(", ");
                println!("{:<22} {}", op.name, op.description);
                if !required.is_empty() {
                    println!("{:<22} required: {}", "", required);
                }
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Call { tool, arguments } => {
            let args: Value = serde_json::from_str(&arguments)
                .map_err(|e| anyhow::anyhow!("arguments must be a JSON object: {}", e))?;
            dispatcher.dispatch(&tool, args).await
        }
        Command::Register {
            id,
            name,
            description,
            source,
            category,
            params,
        } => {
            let code = tokio::fs::read_to_string(&source)
                .await
                .map_err(|e| anyhow::anyhow!("failed to read {}: {}", source.display(), e))?;

            let mut request = RegisterRequest::new(id, name, description, code);
            request.category = category;
            request.params = params;
            dispatcher.register(request).await.into()
        }
        Command::Run {
            uuid,
            plugin_id,
            args,
        } => dispatcher.run_plugin(&uuid, &plugin_id, &args).await.into(),
        Command::Result { task_id } => dispatcher.plugin_result(&task_id).await.into(),
    };

    Ok(report(&response))
}

/// 응답 출력 - 에러 envelope이면 종료 코드 1
fn report(response: &ToolResponse) -> ExitCode {
    if response.is_error {
        eprintln!("Error: {}", response.text);
        ExitCode::FAILURE
    } else {
        println!("{}", response.text);
        ExitCode::SUCCESS
    }
}

/// `name:type[=default]` 파라미터 파싱
pub fn parse_param(input: &str) -> Result<PluginParam, String> {
    let (decl, default) = match input.split_once('=') {
        Some((decl, default)) => (decl, Some(default)),
        None => (input, None),
    };
    let (name, ty) = decl.split_once(':').unwrap_or((decl, "string"));

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("parameter '{}' has no name", input));
    }

    let param_type: ParamType = serde_json::from_value(Value::String(ty.trim().to_string()))
        .map_err(|_| format!("unknown parameter type '{}' (use string, int or bool)", ty))?;

    let mut param = PluginParam::new(name, param_type);
    if let Some(raw) = default {
        let value = match param_type {
            ParamType::String => Value::String(raw.to_string()),
            ParamType::Number | ParamType::Boolean => serde_json::from_str(raw)
                .ok()
                .filter(|v| param_type.accepts(v))
                .ok_or_else(|| format!("default '{}' is not a valid {:?}", raw, param_type))?,
        };
        param = param.with_default(value);
    }
    Ok(param)
}
