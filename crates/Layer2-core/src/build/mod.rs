//! Build Invoker - 외부 빌드 파이프라인 래퍼
//!
//! 빌드 도구는 불투명한 외부 프로세스로 취급합니다.
//! 성공은 종료 코드 0, 실패 시 stderr가 진단 메시지입니다.
//!
//! `BuildInvoker` trait 뒤에 숨겨져 있어서 등록 파이프라인은
//! 실제 툴체인 없이 가짜 invoker로 테스트할 수 있습니다.

mod command;

pub use command::CommandBuildInvoker;

use armory_foundation::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// BuildResult
// ============================================================================

/// 빌드 종료 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// 종료 코드 0
    Success,
    /// 0이 아닌 종료 코드 (시그널 종료면 `None`) 또는 시작 실패
    Failed { code: Option<i32> },
    /// 타임아웃 - 프로세스는 종료됨
    TimedOut { after: Duration },
}

/// 빌드 결과 (저장되지 않음)
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub status: BuildStatus,
    pub stdout: String,
    pub stderr: String,
}

impl BuildResult {
    pub fn success() -> Self {
        Self {
            status: BuildStatus::Success,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self {
            status: BuildStatus::Failed { code },
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn timed_out(after: Duration, stderr: impl Into<String>) -> Self {
        Self {
            status: BuildStatus::TimedOut { after },
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == BuildStatus::Success
    }

    /// 호출자에게 그대로 전달할 진단 텍스트
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim_end();
        match &self.status {
            BuildStatus::Success => String::new(),
            BuildStatus::TimedOut { after } => {
                let mut msg = format!(
                    "build timed out after {}s; build process was terminated",
                    after.as_secs_f64()
                );
                if !stderr.is_empty() {
                    msg.push('\n');
                    msg.push_str(stderr);
                }
                msg
            }
            BuildStatus::Failed { code } => {
                if !stderr.is_empty() {
                    stderr.to_string()
                } else if !self.stdout.trim().is_empty() {
                    self.stdout.trim_end().to_string()
                } else {
                    match code {
                        Some(c) => format!("build exited with status {}", c),
                        None => "build terminated by signal".to_string(),
                    }
                }
            }
        }
    }
}

// ============================================================================
// BuildInvoker trait
// ============================================================================

/// 플러그인 빌드 인터페이스
///
/// 구현체는 재시도하지 않습니다. 반환된 future를 drop 하면 빌드가
/// 취소되고 실행 중인 프로세스도 종료되어야 합니다.
#[async_trait]
pub trait BuildInvoker: Send + Sync {
    /// `working_dir`에서 `plugin_id`를 빌드
    async fn build(&self, plugin_id: &str, working_dir: &Path) -> Result<BuildResult>;
}
