//! Plugin Manifest - 플러그인 디스크립터 정의
//!
//! manifest.json 한 항목의 구조입니다. 필드 이름은 백엔드가 읽는
//! 형식(`file_name`, `type`, `required_os`, `params`)을 그대로 따릅니다.

use armory_foundation::strings::PLUGIN_KIND_WASM_SKILL;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// PluginKind - 산출물 형식
// ============================================================================

/// 산출물 형식/런타임 태그
///
/// 현재 정의된 값은 `wasm-skill` 하나지만 열린 열거형이라
/// 알 수 없는 값도 그대로 보존합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PluginKind {
    /// 샌드박스 WebAssembly 모듈
    WasmSkill,
    Other(String),
}

impl PluginKind {
    pub fn as_str(&self) -> &str {
        match self {
            PluginKind::WasmSkill => PLUGIN_KIND_WASM_SKILL,
            PluginKind::Other(s) => s,
        }
    }
}

impl From<String> for PluginKind {
    fn from(s: String) -> Self {
        if s == PLUGIN_KIND_WASM_SKILL {
            PluginKind::WasmSkill
        } else {
            PluginKind::Other(s)
        }
    }
}

impl From<&str> for PluginKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<PluginKind> for String {
    fn from(kind: PluginKind) -> Self {
        match kind {
            PluginKind::WasmSkill => PLUGIN_KIND_WASM_SKILL.to_string(),
            PluginKind::Other(s) => s,
        }
    }
}

impl Default for PluginKind {
    fn default() -> Self {
        Self::WasmSkill
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PluginCategory - 분류
// ============================================================================

/// 플러그인 분류
///
/// 자유 문자열이지만 관례상 아래 상수 중 하나를 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginCategory(String);

impl PluginCategory {
    pub const DISCOVERY: &'static str = "Discovery";
    pub const CREDENTIAL: &'static str = "Credential";
    pub const POST_EXPLOITATION: &'static str = "Post-Ex";

    pub fn new(category: impl Into<String>) -> Self {
        Self(category.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 관례적인 분류 값인지 확인
    pub fn is_conventional(&self) -> bool {
        [Self::DISCOVERY, Self::CREDENTIAL, Self::POST_EXPLOITATION].contains(&self.0.as_str())
    }
}

impl Default for PluginCategory {
    fn default() -> Self {
        Self::new(Self::DISCOVERY)
    }
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// PluginParam - 파라미터 디스크립터
// ============================================================================

/// 파라미터 타입
///
/// 저장 형식은 `string`/`number`/`boolean`이고, 등록 입력에서 쓰는
/// `int`/`integer`/`bool` 표기도 받아들입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    #[serde(alias = "int", alias = "integer")]
    Number,
    #[serde(alias = "bool")]
    Boolean,
}

impl Default for ParamType {
    fn default() -> Self {
        Self::String
    }
}

impl ParamType {
    /// 기본값이 이 타입과 맞는지 확인
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
        }
    }
}

/// 플러그인 파라미터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginParam {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type", default)]
    pub param_type: ParamType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PluginParam {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            param_type,
            default: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

// ============================================================================
// PluginDescriptor - manifest 항목
// ============================================================================

/// manifest.json의 플러그인 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// 고유 ID (등록자가 지정)
    pub id: String,

    pub name: String,

    pub description: String,

    /// manifest 옆에 있어야 하는 컴파일 산출물 파일명
    #[serde(rename = "file_name")]
    pub artifact_file_name: String,

    #[serde(rename = "type")]
    pub kind: PluginKind,

    pub category: PluginCategory,

    #[serde(rename = "required_os")]
    pub required_platform: String,

    /// 파라미터 목록 (`null`도 빈 목록으로 읽음)
    #[serde(rename = "params", default, deserialize_with = "null_as_empty")]
    pub parameters: Vec<PluginParam>,
}

impl PluginDescriptor {
    /// 새 디스크립터 생성 - 산출물 이름은 `<id>.wasm`
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            artifact_file_name: artifact_file_name(&id, "wasm"),
            id,
            name: name.into(),
            description: String::new(),
            kind: PluginKind::default(),
            category: PluginCategory::default(),
            required_platform: "windows".to_string(),
            parameters: Vec::new(),
        }
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// 빌더 패턴: 산출물 파일명 설정
    pub fn with_artifact(mut self, file_name: impl Into<String>) -> Self {
        self.artifact_file_name = file_name.into();
        self
    }

    /// 빌더 패턴: 종류 설정
    pub fn with_kind(mut self, kind: impl Into<PluginKind>) -> Self {
        self.kind = kind.into();
        self
    }

    /// 빌더 패턴: 분류 설정
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = PluginCategory::new(category);
        self
    }

    /// 빌더 패턴: 대상 플랫폼 설정
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.required_platform = platform.into();
        self
    }

    /// 빌더 패턴: 파라미터 추가
    pub fn with_param(mut self, param: PluginParam) -> Self {
        self.parameters.push(param);
        self
    }
}

/// 관례적인 산출물 파일명 (`<id>.<ext>`)
pub fn artifact_file_name(id: &str, extension: &str) -> String {
    format!("{}.{}", id, extension.trim_start_matches('.'))
}

pub(crate) fn null_as_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<PluginParam>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<PluginParam>>::deserialize(deserializer)?.unwrap_or_default())
}
