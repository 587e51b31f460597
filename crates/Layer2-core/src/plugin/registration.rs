//! Registration Pipeline - 소스 → 빌드 → manifest
//!
//! 각 단계가 다음 단계를 막는 순서 고정 워크플로우:
//!
//! 1. 입력 검증 (부작용 없음)
//! 2. `<skillsDir>/<id>/lib.rs` 에 소스 기록
//! 3. 빌드 실행 - 실패하면 소스는 남기고 manifest는 건드리지 않음
//! 4. 디스크립터 생성 후 `ManifestStore::upsert`
//!
//! manifest 잠금은 4단계에서만 잡히고 빌드 중에는 잡히지 않습니다.

use super::manifest::{artifact_file_name, null_as_empty, PluginDescriptor, PluginParam};
use super::store::{ManifestStore, UpsertOutcome};
use crate::build::BuildInvoker;
use armory_foundation::strings::PLUGIN_SOURCE_FILE;
use armory_foundation::{BridgeConfig, Error, PluginDefaults, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

// ============================================================================
// RegisterRequest
// ============================================================================

/// 플러그인 등록 요청
///
/// 필수 필드가 빠져도 역직렬화는 성공하고, 검증 단계에서
/// `Validation` 에러로 보고됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// 플러그인 소스 코드
    #[serde(default, alias = "source")]
    pub rust_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Vec<PluginParam>,

    /// 산출물 종류 (기본: 설정값)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_os: Option<String>,
}

impl RegisterRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        rust_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            rust_code: rust_code.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_param(mut self, param: PluginParam) -> Self {
        self.params.push(param);
        self
    }

    /// 입력 검증 - 파일시스템/프로세스를 건드리기 전에 호출
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.id.trim().is_empty() {
            missing.push("id");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.rust_code.trim().is_empty() {
            missing.push("rust_code");
        }
        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        if !is_safe_plugin_id(&self.id) {
            return Err(Error::Validation(format!(
                "invalid plugin id '{}': use only letters, digits, '-' and '_'",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        for param in &self.params {
            if param.name.trim().is_empty() {
                return Err(Error::Validation("parameter name must not be empty".to_string()));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate parameter '{}'",
                    param.name
                )));
            }
            if let Some(default) = &param.default {
                if !param.param_type.accepts(default) {
                    return Err(Error::Validation(format!(
                        "default for parameter '{}' does not match its type",
                        param.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// 메타데이터 + 기본값으로 디스크립터 생성
    fn into_descriptor(self, defaults: &PluginDefaults) -> PluginDescriptor {
        let artifact = artifact_file_name(&self.id, &defaults.artifact_extension);
        let category = self
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| defaults.category.clone());
        let kind = self
            .kind
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| defaults.kind.clone());
        let platform = self
            .required_os
            .filter(|os| !os.trim().is_empty())
            .unwrap_or_else(|| defaults.required_os.clone());

        let mut descriptor = PluginDescriptor::new(self.id, self.name)
            .with_description(self.description)
            .with_artifact(artifact)
            .with_kind(kind)
            .with_category(category)
            .with_platform(platform);
        descriptor.parameters = self.params;
        descriptor
    }
}

/// 경로 한 조각으로 안전한 ID인지 확인
pub fn is_safe_plugin_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// 등록 결과
#[derive(Debug, Clone)]
pub struct Registration {
    pub descriptor: PluginDescriptor,
    pub outcome: UpsertOutcome,
    pub source_path: PathBuf,
}

// ============================================================================
// RegistrationPipeline
// ============================================================================

/// 플러그인 등록 파이프라인
pub struct RegistrationPipeline {
    /// 플러그인 소스 루트
    skills_dir: PathBuf,

    /// 빌드 작업 디렉토리
    build_dir: PathBuf,

    store: Arc<ManifestStore>,
    invoker: Arc<dyn BuildInvoker>,
    defaults: PluginDefaults,

    /// 빌드 후 산출물 존재 확인
    require_artifact: bool,
}

impl RegistrationPipeline {
    pub fn new(
        skills_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        store: Arc<ManifestStore>,
        invoker: Arc<dyn BuildInvoker>,
    ) -> Self {
        Self {
            skills_dir: skills_dir.into(),
            build_dir: build_dir.into(),
            store,
            invoker,
            defaults: PluginDefaults::default(),
            require_artifact: true,
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &BridgeConfig, invoker: Arc<dyn BuildInvoker>) -> Self {
        Self::new(
            config.paths.skills_dir(),
            config.paths.workspace_root.clone(),
            Arc::new(ManifestStore::new(config.paths.manifest_path())),
            invoker,
        )
        .with_defaults(config.plugin.clone())
        .with_require_artifact(config.build.require_artifact)
    }

    pub fn with_defaults(mut self, defaults: PluginDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_require_artifact(mut self, require: bool) -> Self {
        self.require_artifact = require;
        self
    }

    pub fn store(&self) -> &Arc<ManifestStore> {
        &self.store
    }

    /// 소스 파일 경로
    pub fn source_path(&self, plugin_id: &str) -> PathBuf {
        self.skills_dir.join(plugin_id).join(PLUGIN_SOURCE_FILE)
    }

    /// 플러그인 등록
    pub async fn register(&self, request: RegisterRequest) -> Result<Registration> {
        // 1. 검증
        request.validate()?;
        let id = request.id.clone();
        info!("Registering plugin '{}'", id);

        // 2. 소스 기록
        let source_path = self.source_path(&id);
        write_source(&source_path, &request.rust_code).await?;

        // 3. 빌드 (manifest 잠금 없이)
        let result = self.invoker.build(&id, &self.build_dir).await?;
        if !result.is_success() {
            warn!("Build failed for '{}': {:?}", id, result.status);
            return Err(Error::build_failure(&id, result.diagnostic()));
        }

        let descriptor = request.into_descriptor(&self.defaults);
        if !descriptor.category.is_conventional() {
            warn!(
                "Plugin '{}' uses non-standard category '{}'",
                id, descriptor.category
            );
        }

        if self.require_artifact {
            let artifact = self.store.artifact_dir().join(&descriptor.artifact_file_name);
            if !fs::try_exists(&artifact).await? {
                warn!("Build for '{}' produced no artifact at {:?}", id, artifact);
                return Err(Error::build_failure(
                    &id,
                    format!(
                        "build reported success but artifact {} was not found",
                        artifact.display()
                    ),
                ));
            }
        }

        // 4. manifest 반영
        let outcome = self.store.upsert(descriptor.clone()).await?;
        info!("Plugin '{}' registered ({:?})", id, outcome);

        Ok(Registration {
            descriptor,
            outcome,
            source_path,
        })
    }
}

async fn write_source(path: &Path, code: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    fs::write(path, code).await?;
    Ok(())
}

// ============================================================================
// 테스트
// ============================================================================
