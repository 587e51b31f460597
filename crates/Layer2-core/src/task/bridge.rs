//! Task Bridge - 제출된 task 추적 + 결과 조회

use super::TaskLedger;
use crate::remote::{RemoteBackend, RemoteRequest};
use armory_foundation::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Task 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 원격에서 실행 중 (결과 없음)
    Pending,
    /// 결과 수신 완료
    Complete,
}

/// 이 브릿지를 통해 제출된 플러그인 실행
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncTask {
    pub task_id: String,

    /// 대상 엔드포인트 uuid
    pub endpoint_id: String,

    pub plugin_id: String,

    /// 플러그인 인자 (원문 문자열)
    pub args: String,

    pub status: TaskStatus,

    pub submitted_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl AsyncTask {
    fn new(task_id: String, endpoint_id: &str, plugin_id: &str, args: &str) -> Self {
        Self {
            task_id,
            endpoint_id: endpoint_id.to_string(),
            plugin_id: plugin_id.to_string(),
            args: args.to_string(),
            status: TaskStatus::Pending,
            submitted_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

/// `/api/plugins/run` 응답
#[derive(Debug, Deserialize)]
struct RunReply {
    #[serde(default)]
    status: String,
    #[serde(default)]
    task_id: Option<Value>,
}

// ============================================================================
// TaskBridge
// ============================================================================

/// 비동기 플러그인 실행 브릿지
pub struct TaskBridge {
    backend: Arc<dyn RemoteBackend>,

    /// 제출 순서대로 보관
    tasks: RwLock<Vec<AsyncTask>>,

    /// 프로세스 간 공유 기록 (없으면 메모리 전용)
    ledger: Option<TaskLedger>,
}

impl TaskBridge {
    /// 메모리 전용 브릿지
    pub fn new(backend: Arc<dyn RemoteBackend>) -> Self {
        Self {
            backend,
            tasks: RwLock::new(Vec::new()),
            ledger: None,
        }
    }

    /// 기록 파일을 불러와서 이어 쓰는 브릿지
    pub fn with_ledger(backend: Arc<dyn RemoteBackend>, ledger: TaskLedger) -> Result<Self> {
        let tasks = ledger.load()?;
        debug!("Loaded {} task records from {:?}", tasks.len(), ledger.path());
        Ok(Self {
            backend,
            tasks: RwLock::new(tasks),
            ledger: Some(ledger),
        })
    }

    pub fn ledger(&self) -> Option<&TaskLedger> {
        self.ledger.as_ref()
    }

    /// 플러그인 실행 제출 - 완료를 기다리지 않음
    pub async fn submit(&self, endpoint_id: &str, plugin_id: &str, args: &str) -> Result<String> {
        if endpoint_id.trim().is_empty() {
            return Err(Error::Validation("endpoint id must not be empty".to_string()));
        }
        if plugin_id.trim().is_empty() {
            return Err(Error::Validation("plugin id must not be empty".to_string()));
        }

        let request = RemoteRequest::post(
            "api/plugins/run",
            json!({
                "uuid": endpoint_id,
                "plugin_id": plugin_id,
                "args": args,
            }),
        );
        let reply = self.backend.send(request).await?;
        let status = reply.status;
        let body = reply.into_text()?;

        let task_id = parse_run_reply(&body)
            .ok_or_else(|| Error::remote(Some(status), format!("unexpected run reply: {}", body)))?;

        let mut tasks = self.tasks.write().await;
        self.merge_ledger(&mut tasks).await;
        tasks.retain(|t| t.task_id != task_id);
        tasks.push(AsyncTask::new(task_id.clone(), endpoint_id, plugin_id, args));
        self.persist(&tasks).await;
        drop(tasks);

        info!(
            "Submitted plugin '{}' to endpoint {} as task {}",
            plugin_id, endpoint_id, task_id
        );
        Ok(task_id)
    }

    /// 결과 조회
    ///
    /// 아직 끝나지 않았으면 `Error::Pending` (실패 아님, 다시 폴링).
    pub async fn fetch_result(&self, task_id: &str) -> Result<String> {
        if task_id.trim().is_empty() {
            return Err(Error::Validation("task id must not be empty".to_string()));
        }

        let request = RemoteRequest::get("api/plugins/result").segment(task_id);
        let reply = self.backend.send(request).await?;

        if reply.is_not_found() {
            return if self.is_known(task_id).await {
                debug!("Task {} still pending", task_id);
                Err(Error::Pending(task_id.to_string()))
            } else {
                Err(Error::UnknownTask(task_id.to_string()))
            };
        }

        let payload = reply.into_text()?;
        let mut tasks = self.tasks.write().await;
        self.merge_ledger(&mut tasks).await;
        if let Some(task) = tasks.iter_mut().find(|t| t.task_id == task_id) {
            if task.is_pending() {
                task.status = TaskStatus::Complete;
                task.completed_at = Some(Utc::now());
                info!("Task {} complete ({} bytes)", task_id, payload.len());
                self.persist(&tasks).await;
            }
        }
        drop(tasks);
        Ok(payload)
    }

    /// 이 브릿지(또는 같은 기록 파일을 쓰는 다른 프로세스)가 제출한 task인지
    pub async fn is_known(&self, task_id: &str) -> bool {
        if self.tasks.read().await.iter().any(|t| t.task_id == task_id) {
            return true;
        }
        if self.ledger.is_none() {
            return false;
        }

        let mut tasks = self.tasks.write().await;
        self.merge_ledger(&mut tasks).await;
        tasks.iter().any(|t| t.task_id == task_id)
    }

    pub async fn get(&self, task_id: &str) -> Option<AsyncTask> {
        self.tasks
            .read()
            .await
            .iter()
            .find(|t| t.task_id == task_id)
            .cloned()
    }

    /// 제출 순서대로 task 목록
    pub async fn list_tasks(&self) -> Vec<AsyncTask> {
        self.tasks.read().await.clone()
    }

    // ========================================================================
    // Ledger
    // ========================================================================

    /// 다른 프로세스가 기록한 task를 합침 (이미 아는 id는 메모리 쪽 유지)
    async fn merge_ledger(&self, tasks: &mut Vec<AsyncTask>) {
        let Some(ledger) = self.ledger.clone() else {
            return;
        };

        let loaded = match tokio::task::spawn_blocking(move || ledger.load()).await {
            Ok(Ok(loaded)) => loaded,
            Ok(Err(e)) => {
                warn!("Failed to read task records: {}", e);
                return;
            }
            Err(e) => {
                warn!("Task record reader panicked: {}", e);
                return;
            }
        };

        let before = tasks.len();
        for record in loaded {
            if !tasks.iter().any(|t| t.task_id == record.task_id) {
                tasks.push(record);
            }
        }
        if tasks.len() != before {
            tasks.sort_by_key(|t| t.submitted_at);
        }
    }

    /// 기록 파일 갱신
    ///
    /// 원격 제출은 이미 끝났으므로 실패해도 task id는 돌려주고 경고만 남깁니다.
    async fn persist(&self, tasks: &[AsyncTask]) {
        let Some(ledger) = self.ledger.clone() else {
            return;
        };

        let snapshot = tasks.to_vec();
        match tokio::task::spawn_blocking(move || ledger.save(&snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to persist task records: {}", e),
            Err(e) => warn!("Task record writer panicked: {}", e),
        }
    }
}

/// `{"status":"success","task_id":..}` 에서 task id 추출 (숫자 id도 허용)
fn parse_run_reply(body: &str) -> Option<String> {
    let reply: RunReply = serde_json::from_str(body).ok()?;
    if reply.status != "success" {
        return None;
    }
    match reply.task_id? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::FakeBackend;
    use crate::remote::Method;
    use tempfile::TempDir;

    const RUN: &str = "/api/plugins/run";
    const RESULT_T42: &str = "/api/plugins/result/T42";

    fn bridge() -> (TaskBridge, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::new());
        (TaskBridge::new(Arc::clone(&backend) as Arc<dyn RemoteBackend>), backend)
    }

    #[tokio::test]
    async fn test_submit_then_poll_until_complete() {
        let (bridge, backend) = bridge();
        backend.reply(RUN, 200, r#"{"status":"success","task_id":"T42"}"#);
        backend.reply(RESULT_T42, 404, "result not found");
        backend.reply(RESULT_T42, 200, "open ports: 22, 80");

        let task_id = bridge.submit("E1", "port-scan", "{}").await.unwrap();
        assert_eq!(task_id, "T42");

        let err = bridge.fetch_result("T42").await.unwrap_err();
        assert!(err.is_pending());

        let payload = bridge.fetch_result("T42").await.unwrap();
        assert_eq!(payload, "open ports: 22, 80");

        let task = bridge.get("T42").await.unwrap();
        assert_eq!(task.status, TaskStatus::Complete);
        assert!(task.completed_at.is_some());

        let requests = backend.requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(
            requests[0].body,
            Some(json!({ "uuid": "E1", "plugin_id": "port-scan", "args": "{}" }))
        );
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_pending() {
        let (bridge, backend) = bridge();
        backend.reply("/api/plugins/result/NOPE", 404, "result not found");

        let err = bridge.fetch_result("NOPE").await.unwrap_err();
        assert!(matches!(err, Error::UnknownTask(ref id) if id == "NOPE"));
        assert!(!err.is_pending());
    }

    #[tokio::test]
    async fn test_submit_failure_records_nothing() {
        let (bridge, backend) = bridge();
        backend.reply(RUN, 400, "client offline");

        let err = bridge.submit("E1", "port-scan", "").await.unwrap_err();
        assert!(matches!(err, Error::Remote { status: Some(400), .. }));
        assert!(bridge.list_tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_run_reply() {
        let (bridge, backend) = bridge();
        backend.reply(RUN, 200, r#"{"status":"error"}"#);

        let err = bridge.submit("E1", "port-scan", "").await.unwrap_err();
        assert_eq!(err.kind(), "remote_error");
        assert!(err.to_string().contains("unexpected run reply"));
    }

    #[tokio::test]
    async fn test_submit_validates_before_sending() {
        let (bridge, backend) = bridge();

        let err = bridge.submit("", "port-scan", "").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_result_server_error_is_remote_error() {
        let (bridge, backend) = bridge();
        backend.reply(RESULT_T42, 500, "disk full");

        let err = bridge.fetch_result("T42").await.unwrap_err();
        assert!(matches!(err, Error::Remote { status: Some(500), .. }));
    }

    #[tokio::test]
    async fn test_list_tasks_in_submission_order() {
        let (bridge, backend) = bridge();
        backend.reply(RUN, 200, r#"{"status":"success","task_id":"T1"}"#);
        backend.reply(RUN, 200, r#"{"status":"success","task_id":7}"#);

        bridge.submit("E1", "a", "").await.unwrap();
        bridge.submit("E2", "b", "x=1").await.unwrap();

        let ids: Vec<_> = bridge
            .list_tasks()
            .await
            .into_iter()
            .map(|t| t.task_id)
            .collect();
        assert_eq!(ids, vec!["T1", "7"]);
    }

    #[tokio::test]
    async fn test_pending_survives_a_new_bridge() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.json");
        let backend = Arc::new(FakeBackend::new());
        backend.reply(RUN, 200, r#"{"status":"success","task_id":"T42"}"#);
        backend.reply(RESULT_T42, 404, "");
        backend.reply("/api/plugins/result/T99", 404, "");

        let first = TaskBridge::with_ledger(
            Arc::clone(&backend) as Arc<dyn RemoteBackend>,
            TaskLedger::new(&path),
        )
        .unwrap();
        first.submit("E1", "port-scan", "{}").await.unwrap();

        let second = TaskBridge::with_ledger(
            Arc::clone(&backend) as Arc<dyn RemoteBackend>,
            TaskLedger::new(&path),
        )
        .unwrap();
        let err = second.fetch_result("T42").await.unwrap_err();
        assert!(err.is_pending(), "{}", err);

        let err = second.fetch_result("T99").await.unwrap_err();
        assert!(matches!(err, Error::UnknownTask(_)));
    }

    #[tokio::test]
    async fn test_running_bridge_sees_later_submissions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.json");
        let backend = Arc::new(FakeBackend::new());
        backend.reply(RUN, 200, r#"{"status":"success","task_id":"T42"}"#);
        backend.reply(RESULT_T42, 404, "");
        backend.reply(RESULT_T42, 200, "done");

        let server = TaskBridge::with_ledger(
            Arc::clone(&backend) as Arc<dyn RemoteBackend>,
            TaskLedger::new(&path),
        )
        .unwrap();
        let cli = TaskBridge::with_ledger(
            Arc::clone(&backend) as Arc<dyn RemoteBackend>,
            TaskLedger::new(&path),
        )
        .unwrap();

        cli.submit("E1", "port-scan", "{}").await.unwrap();
        assert!(server.fetch_result("T42").await.unwrap_err().is_pending());
        assert_eq!(server.fetch_result("T42").await.unwrap(), "done");

        let reloaded = TaskLedger::new(&path).load().unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].status, TaskStatus::Complete);
    }

    #[tokio::test]
    async fn test_corrupt_ledger_fails_construction() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.json");
        std::fs::write(&path, "{oops").unwrap();

        let backend = Arc::new(FakeBackend::new());
        let result = TaskBridge::with_ledger(backend as Arc<dyn RemoteBackend>, TaskLedger::new(&path));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_run_reply() {
        assert_eq!(
            parse_run_reply(r#"{"status":"success","task_id":"T42"}"#),
            Some("T42".to_string())
        );
        assert_eq!(parse_run_reply(r#"{"status":"success","task_id":""}"#), None);
        assert_eq!(parse_run_reply("not json"), None);
    }
}
