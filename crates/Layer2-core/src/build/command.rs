//! Command Build Invoker - 서브프로세스 기반 빌드
//!
//! - 인자 템플릿의 `{id}`를 플러그인 ID로 치환
//! - stdout/stderr 동시 캡처
//! - 타임아웃 시 프로세스 강제 종료
//! - future drop 시에도 프로세스 종료 (`kill_on_drop`)

use super::{BuildInvoker, BuildResult};
use armory_foundation::{BuildConfig, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 플러그인 ID 치환 자리표시자
const ID_PLACEHOLDER: &str = "{id}";

/// 프로세스 종료 후 파이프를 마저 읽는 최대 대기 시간
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// 최대 캡처 크기 (256KB)
const MAX_OUTPUT_SIZE: usize = 256 * 1024;

/// 외부 명령으로 빌드하는 invoker
#[derive(Debug, Clone)]
pub struct CommandBuildInvoker {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandBuildInvoker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// 타임아웃 설정
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `{id}` 치환된 인자 목록
    fn render_args(&self, plugin_id: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(ID_PLACEHOLDER, plugin_id))
            .collect()
    }
}

#[async_trait]
impl BuildInvoker for CommandBuildInvoker {
    async fn build(&self, plugin_id: &str, working_dir: &Path) -> Result<BuildResult> {
        let args = self.render_args(plugin_id);
        info!(
            "Building plugin '{}': {} {:?} (cwd: {:?})",
            plugin_id, self.program, args, working_dir
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn build for '{}': {}", plugin_id, e);
                return Ok(BuildResult::failure(
                    None,
                    format!("failed to start build command '{}': {}", self.program, e),
                ));
            }
        };

        // 파이프가 가득 차서 멈추지 않도록 동시에 읽음
        let stdout_task = spawn_reader(child.stdout.take());
        let stderr_task = spawn_reader(child.stderr.take());

        let started = Instant::now();
        let waited = tokio::time::timeout(self.timeout, child.wait()).await;

        let result = match waited {
            Ok(Ok(status)) => {
                let stdout = collect(stdout_task).await;
                let stderr = collect(stderr_task).await;
                debug!("Build stdout for '{}': {}", plugin_id, stdout);

                if status.success() {
                    BuildResult::success().with_stdout(stdout)
                } else {
                    BuildResult::failure(status.code(), stderr).with_stdout(stdout)
                }
            }
            Ok(Err(e)) => {
                let stderr = collect(stderr_task).await;
                stdout_task.abort();
                BuildResult::failure(None, format!("failed to wait for build: {}\n{}", e, stderr))
            }
            Err(_) => {
                warn!(
                    "Build for '{}' exceeded {:?}, terminating process",
                    plugin_id, self.timeout
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill build process: {}", e);
                }
                let stdout = collect(stdout_task).await;
                let stderr = collect(stderr_task).await;
                BuildResult::timed_out(self.timeout, stderr).with_stdout(stdout)
            }
        };

        info!(
            "Build for '{}' finished in {:?}: {:?}",
            plugin_id,
            started.elapsed(),
            result.status
        );
        Ok(result)
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = pipe {
            let _ = pipe.take(MAX_OUTPUT_SIZE as u64).read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// 리더 결과 수집 - 손자 프로세스가 파이프를 잡고 있으면 포기
async fn collect(mut task: JoinHandle<String>) -> String {
    match tokio::time::timeout(DRAIN_GRACE, &mut task).await {
        Ok(Ok(output)) => output,
        Ok(Err(_)) => String::new(),
        Err(_) => {
            task.abort();
            String::new()
        }
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::build::BuildStatus;
    use tempfile::TempDir;

    fn sh(script: &str) -> CommandBuildInvoker {
        CommandBuildInvoker::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_render_args() {
        let invoker = CommandBuildInvoker::new(
            "powershell.exe",
            vec!["-File".to_string(), "build.ps1".to_string(), "{id}".to_string()],
        );
        assert_eq!(
            invoker.render_args("port-scan"),
            vec!["-File", "build.ps1", "port-scan"]
        );
    }

    #[tokio::test]
    async fn test_successful_build() {
        let temp = TempDir::new().unwrap();
        let invoker = sh("printf 'built %s' {id}");

        let result = invoker.build("port-scan", temp.path()).await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.stdout, "built port-scan");
    }

    #[tokio::test]
    async fn test_build_runs_in_working_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker"), "").unwrap();
        let invoker = sh("test -f marker");

        let result = invoker.build("x", temp.path()).await.unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_failed_build_captures_stderr() {
        let temp = TempDir::new().unwrap();
        let invoker = sh("echo compiling; echo 'syntax error' >&2; exit 1");

        let result = invoker.build("bad", temp.path()).await.unwrap();
        assert_eq!(result.status, BuildStatus::Failed { code: Some(1) });
        assert_eq!(result.diagnostic(), "syntax error");
        assert_eq!(result.stdout.trim(), "compiling");
    }

    #[tokio::test]
    async fn test_missing_program_is_failure() {
        let temp = TempDir::new().unwrap();
        let invoker = CommandBuildInvoker::new("definitely-not-a-build-tool-3f9a", vec![]);

        let result = invoker.build("x", temp.path()).await.unwrap();
        assert_eq!(result.status, BuildStatus::Failed { code: None });
        assert!(result.diagnostic().contains("failed to start build command"));
    }

    #[tokio::test]
    async fn test_timeout_terminates_process() {
        let temp = TempDir::new().unwrap();
        let invoker = sh("exec sleep 30").with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        let result = invoker.build("slow", temp.path()).await.unwrap();

        assert!(matches!(result.status, BuildStatus::TimedOut { .. }));
        assert!(result.diagnostic().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_leaves_no_process_behind() {
        let temp = TempDir::new().unwrap();
        let invoker =
            sh("echo $$ > build.pid; exec sleep 30").with_timeout(Duration::from_millis(300));

        let result = invoker.build("slow", temp.path()).await.unwrap();
        assert!(matches!(result.status, BuildStatus::TimedOut { .. }));

        let pid = std::fs::read_to_string(temp.path().join("build.pid")).unwrap();
        let proc_path = format!("/proc/{}", pid.trim());
        assert!(!Path::new(&proc_path).exists());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_dropping_build_future_kills_process() {
        let temp = TempDir::new().unwrap();
        let invoker = sh("echo $$ > build.pid; exec sleep 30");

        let cancelled =
            tokio::time::timeout(Duration::from_millis(300), invoker.build("x", temp.path()))
                .await;
        assert!(cancelled.is_err());

        let pid = std::fs::read_to_string(temp.path().join("build.pid")).unwrap();
        let proc_path = format!("/proc/{}", pid.trim());

        // kill_on_drop은 SIGKILL 후 백그라운드에서 회수하므로 잠시 대기
        let mut gone = false;
        for _ in 0..50 {
            let status = std::fs::read_to_string(format!("{}/status", proc_path));
            match status {
                Err(_) => {
                    gone = true;
                    break;
                }
                Ok(s) if s.contains("State:\tZ") => {
                    gone = true;
                    break;
                }
                Ok(_) => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
        assert!(gone, "build process still running after cancellation");
    }
}
