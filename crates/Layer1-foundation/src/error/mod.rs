//! Error types for Armory
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Armory 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 입력 관련
    // ========================================================================
    /// 잘못된/누락된 입력 - 부작용 없음
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    // ========================================================================
    // 빌드 관련
    // ========================================================================
    #[error("Build failed for plugin '{plugin_id}': {diagnostic}")]
    BuildFailure {
        plugin_id: String,
        diagnostic: String,
    },

    // ========================================================================
    // Manifest 관련
    // ========================================================================
    /// 매니페스트 쓰기 실패 - 이전 매니페스트는 그대로 유지됨
    #[error("Persist error: {0}")]
    Persist(String),

    #[error("Corrupt manifest: {0}")]
    CorruptManifest(String),

    // ========================================================================
    // 원격 백엔드 관련
    // ========================================================================
    #[error("{}", format_remote(.status, .message))]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// 실패가 아님 - 작업이 아직 끝나지 않음
    #[error("Task {0} is still pending")]
    Pending(String),

    #[error("Unknown task: {0} was never submitted through this bridge")]
    UnknownTask(String),

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_remote(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Remote error (HTTP {}): {}", code, message),
        None => format!("Remote error: {}", message),
    }
}

impl Error {
    /// 응답 envelope에 들어가는 안정적인 에러 종류 태그
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::UnknownOperation(_) => "unknown_operation",
            Error::BuildFailure { .. } => "build_failure",
            Error::Persist(_) => "persist_error",
            Error::CorruptManifest(_) => "corrupt_manifest",
            Error::Remote { .. } => "remote_error",
            Error::Pending(_) => "pending",
            Error::UnknownTask(_) => "unknown_task",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Pending은 실패가 아니라 "다시 조회하라"는 신호
    pub fn is_pending(&self) -> bool {
        matches!(self, Error::Pending(_))
    }

    /// 호출자가 입력을 고쳐서 다시 시도할 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::UnknownOperation(_)
                | Error::BuildFailure { .. }
                | Error::UnknownTask(_)
        )
    }

    /// 빌드 실패 에러 생성 헬퍼
    pub fn build_failure(plugin_id: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Error::BuildFailure {
            plugin_id: plugin_id.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// 원격 에러 생성 헬퍼
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Remote {
            status,
            message: message.into(),
        }
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failure_carries_diagnostic() {
        let err = Error::build_failure("bad", "syntax error");
        assert_eq!(err.kind(), "build_failure");
        assert!(err.to_string().contains("syntax error"));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_remote_display() {
        let with_status = Error::remote(Some(500), "boom");
        assert_eq!(with_status.to_string(), "Remote error (HTTP 500): boom");

        let without_status = Error::remote(None, "connection refused");
        assert_eq!(without_status.to_string(), "Remote error: connection refused");
    }

    #[test]
    fn test_pending_is_not_unknown_task() {
        let pending = Error::Pending("T42".to_string());
        let unknown = Error::UnknownTask("T42".to_string());

        assert!(pending.is_pending());
        assert!(!unknown.is_pending());
        assert_ne!(pending.kind(), unknown.kind());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert_eq!(err.kind(), "io_error");
    }
}
