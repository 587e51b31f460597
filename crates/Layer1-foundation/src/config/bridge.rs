//! Bridge Config - 통합 설정
//!
//! 백엔드 URL, 인증 토큰 같은 값은 프로세스 전역 상태가 아니라
//! 이 구조체로 명시적으로 전달됩니다.

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// 설정 파일명
pub const ARMORY_CONFIG_FILE: &str = "armory.json";

/// task 기록 파일명
pub const TASKS_FILE: &str = "tasks.json";

/// 백엔드 URL 환경 변수
pub const ENV_BACKEND_URL: &str = "ARMORY_BACKEND_URL";
/// API 토큰 환경 변수
pub const ENV_API_TOKEN: &str = "ARMORY_API_TOKEN";
/// 작업 루트 환경 변수
pub const ENV_WORKSPACE: &str = "ARMORY_WORKSPACE";

// ============================================================================
// Bridge Config (통합)
// ============================================================================

/// Armory 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// 원격 백엔드 연결 정보
    #[serde(default)]
    pub backend: BackendConfig,

    /// 파일 경로
    #[serde(default)]
    pub paths: PathsConfig,

    /// 외부 빌드 명령
    #[serde(default)]
    pub build: BuildConfig,

    /// 등록 시 기본값
    #[serde(default)]
    pub plugin: PluginDefaults,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드 후 환경 변수 적용
    pub fn load() -> Result<Self> {
        let mut merged = Value::Object(Default::default());

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            if let Some(value) = global.read::<Value>(ARMORY_CONFIG_FILE)? {
                debug!("Loaded global config from {:?}", global.dir());
                merge_values(&mut merged, value);
            }
        }

        // 2. 프로젝트 설정
        let project = JsonStore::current_project()?;
        if let Some(value) = project.read::<Value>(ARMORY_CONFIG_FILE)? {
            debug!("Loaded project config from {:?}", project.dir());
            merge_values(&mut merged, value);
        }

        let mut config: Self = serde_json::from_value(merged)
            .map_err(|e| Error::Config(format!("Invalid {}: {}", ARMORY_CONFIG_FILE, e)))?;

        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 지정된 파일 하나만 로드 (환경 변수 적용 포함)
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 환경 변수 덮어쓰기
    ///
    /// 조회 함수를 받아서 테스트에서 프로세스 환경을 건드리지 않도록 합니다.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.backend.api_token = token;
        }
        if let Some(root) = lookup(ENV_WORKSPACE).filter(|v| !v.trim().is_empty()) {
            self.paths.workspace_root = PathBuf::from(root);
        }
    }

    /// 설정 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(Error::Config("backend.baseUrl must not be empty".to_string()));
        }
        if self.backend.timeout_secs == 0 {
            return Err(Error::Config("backend.timeoutSecs must be positive".to_string()));
        }
        if self.build.timeout_secs == 0 {
            return Err(Error::Config("build.timeoutSecs must be positive".to_string()));
        }
        if self.build.program.trim().is_empty() {
            return Err(Error::Config("build.program must not be empty".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.backend.base_url = url.into();
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.backend.api_token = token.into();
        self
    }

    pub fn workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths.workspace_root = root.into();
        self
    }
}

/// JSON 값 깊은 병합 (overlay가 우선)
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ============================================================================
// Backend Config
// ============================================================================

/// 원격 C2 백엔드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// 백엔드 기본 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer 토큰
    #[serde(default)]
    pub api_token: String,

    /// 요청 타임아웃 (초)
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:9999/".to_string()
}

fn default_backend_timeout() -> u64 {
    15
}

// ============================================================================
// Paths Config
// ============================================================================

/// 파일 경로 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsConfig {
    /// 빌드 작업 디렉토리 (Skills/, server/ 의 상위)
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// 플러그인 소스 디렉토리 (기본: `<root>/Skills`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_dir: Option<PathBuf>,

    /// manifest.json 경로 (기본: `<root>/server/assets/plugins/manifest.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            skills_dir: None,
            manifest_path: None,
        }
    }
}

impl PathsConfig {
    pub fn skills_dir(&self) -> PathBuf {
        self.skills_dir
            .clone()
            .unwrap_or_else(|| self.workspace_root.join("Skills"))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path.clone().unwrap_or_else(|| {
            self.workspace_root
                .join("server")
                .join("assets")
                .join("plugins")
                .join("manifest.json")
        })
    }

    /// 제출된 task 기록 파일 (manifest 옆)
    pub fn tasks_path(&self) -> PathBuf {
        self.manifest_path().with_file_name(TASKS_FILE)
    }
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

// ============================================================================
// Build Config
// ============================================================================

/// 외부 빌드 명령 설정
///
/// `args` 안의 `{id}`는 플러그인 ID로 치환됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(default = "default_build_program")]
    pub program: String,

    #[serde(default = "default_build_args")]
    pub args: Vec<String>,

    /// 빌드 타임아웃 (초)
    #[serde(default = "default_build_timeout")]
    pub timeout_secs: u64,

    /// 빌드 성공 후 산출물 존재 확인
    #[serde(default = "default_true")]
    pub require_artifact: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: default_build_program(),
            args: default_build_args(),
            timeout_secs: default_build_timeout(),
            require_artifact: true,
        }
    }
}

fn default_build_program() -> String {
    "powershell.exe".to_string()
}

fn default_build_args() -> Vec<String> {
    ["-ExecutionPolicy", "Bypass", "-File", "build_v3_skill.ps1", "{id}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_build_timeout() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Plugin Defaults
// ============================================================================

/// 등록 요청에 값이 없을 때 사용하는 기본값
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDefaults {
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default = "default_required_os")]
    pub required_os: String,

    /// 산출물 확장자 (점 제외)
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,
}

impl Default for PluginDefaults {
    fn default() -> Self {
        Self {
            category: default_category(),
            kind: default_kind(),
            required_os: default_required_os(),
            artifact_extension: default_artifact_extension(),
        }
    }
}

fn default_category() -> String {
    "Discovery".to_string()
}

fn default_kind() -> String {
    "wasm-skill".to_string()
}

fn default_required_os() -> String {
    "windows".to_string()
}

fn default_artifact_extension() -> String {
    "wasm".to_string()
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:9999/");
        assert_eq!(config.backend.timeout_secs, 15);
        assert_eq!(config.build.timeout_secs, 300);
        assert!(config.build.require_artifact);
        assert_eq!(config.plugin.kind, "wasm-skill");
        assert_eq!(config.plugin.category, "Discovery");
        assert_eq!(
            config.paths.manifest_path(),
            PathBuf::from("./server/assets/plugins/manifest.json")
        );
        assert_eq!(config.paths.skills_dir(), PathBuf::from("./Skills"));
        assert_eq!(
            config.paths.tasks_path(),
            PathBuf::from("./server/assets/plugins/tasks.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: BridgeConfig = serde_json::from_value(json!({
            "backend": { "apiToken": "secret" },
            "build": { "timeoutSecs": 60 }
        }))
        .unwrap();

        assert_eq!(config.backend.api_token, "secret");
        assert_eq!(config.backend.base_url, "http://127.0.0.1:9999/");
        assert_eq!(config.build.timeout_secs, 60);
        assert_eq!(config.build.program, "powershell.exe");
    }

    #[test]
    fn test_merge_values_overlay_wins() {
        let mut base = json!({ "backend": { "baseUrl": "http://a/", "apiToken": "t1" } });
        merge_values(&mut base, json!({ "backend": { "apiToken": "t2" } }));

        assert_eq!(base["backend"]["baseUrl"], "http://a/");
        assert_eq!(base["backend"]["apiToken"], "t2");
    }

    #[test]
    fn test_apply_env() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://c2.internal:8080/"),
            (ENV_API_TOKEN, "tok"),
            (ENV_WORKSPACE, "/srv/armory"),
        ]
        .into_iter()
        .collect();

        let mut config = BridgeConfig::default();
        config.apply_env_with(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "http://c2.internal:8080/");
        assert_eq!(config.backend.api_token, "tok");
        assert_eq!(
            config.paths.skills_dir(),
            PathBuf::from("/srv/armory/Skills")
        );
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = BridgeConfig::default();
        config.build.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = BridgeConfig::default().base_url("  ");
        assert!(config.validate().is_err());
    }
}
