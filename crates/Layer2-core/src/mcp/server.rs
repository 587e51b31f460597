//! MCP Server - stdio JSON-RPC 프론트엔드
//!
//! 줄 단위 JSON-RPC 메시지를 읽어 Dispatcher로 넘깁니다.
//! 요청은 각각 독립된 task에서 처리되므로 긴 빌드가 결과 폴링을 막지 않고,
//! 응답은 하나의 writer task가 순서대로 기록합니다.

use super::types::*;
use crate::dispatch::Dispatcher;
use armory_foundation::{Error, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// MCP stdio 서버
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// stdin/stdout으로 서비스
    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// 입력이 끝날 때까지 서비스 (진행 중인 요청은 마저 처리)
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!("MCP server listening on stdio (protocol {})", MCP_PROTOCOL_VERSION);

        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(rx, writer));

        let mut lines = reader.lines();
        let mut inflight = JoinSet::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let server = Arc::clone(&self);
            let tx = tx.clone();
            inflight.spawn(async move {
                if let Some(response) = server.handle_line(&line).await {
                    let _ = tx.send(response);
                }
            });
        }

        debug!("stdin closed, waiting for {} in-flight requests", inflight.len());
        while inflight.join_next().await.is_some() {}
        drop(tx);

        writer_task
            .await
            .map_err(|e| Error::Internal(format!("MCP writer task failed: {}", e)))??;
        info!("MCP server stopped");
        Ok(())
    }

    /// 메시지 한 줄 처리 - 알림이면 `None`
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let message: JsonRpcMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Malformed JSON-RPC message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        let Some(method) = message.method.clone() else {
            // 클라이언트가 보낸 응답이거나 잘못된 요청
            return message
                .id
                .map(|id| JsonRpcResponse::failure(id, JsonRpcError::invalid_request()));
        };

        if message.is_notification() {
            debug!("Notification: {}", method);
            return None;
        }

        let id = message.id.unwrap_or(Value::Null);
        let response = match self.handle_request(&method, message.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        };
        Some(response)
    }

    async fn handle_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> std::result::Result<Value, JsonRpcError> {
        debug!("Request: {}", method);
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": MCP_SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.dispatcher.list_operations() })),
            "tools/call" => {
                let call: McpToolCall = params
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?
                    .ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;

                let response = self.dispatcher.dispatch(&call.name, call.arguments).await;
                serde_json::to_value(McpToolResult::from(response))
                    .map_err(|e| JsonRpcError::invalid_params(e.to_string()))
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }
}

async fn write_responses<W>(
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
    mut writer: W,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_string(&response)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

// ============================================================================
// 테스트
// ============================================================================
