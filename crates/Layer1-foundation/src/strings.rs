//! Shared string constants
//!
//! 도구 이름, 스키마 타입, 플러그인 기본값처럼 여러 레이어에서 쓰는
//! 정적 문자열을 한곳에 모아둡니다.

// ============================================================================
// Schema Constants
// ============================================================================

/// JSON Schema type: object
pub const SCHEMA_TYPE_OBJECT: &str = "object";
/// JSON Schema type: string
pub const SCHEMA_TYPE_STRING: &str = "string";
/// JSON Schema type: number
pub const SCHEMA_TYPE_NUMBER: &str = "number";
/// JSON Schema type: boolean
pub const SCHEMA_TYPE_BOOLEAN: &str = "boolean";
/// JSON Schema type: array
pub const SCHEMA_TYPE_ARRAY: &str = "array";

// ============================================================================
// Tool Constants
// ============================================================================

pub const TOOL_GET_CLIENTS: &str = "get_clients";
pub const TOOL_SEND_CMD: &str = "send_cmd";
pub const TOOL_LIST_PLUGINS: &str = "list_plugins";
pub const TOOL_LIST_FILES: &str = "list_files";
pub const TOOL_LIST_PROCESSES: &str = "list_processes";
pub const TOOL_GET_HISTORY: &str = "get_history";
pub const TOOL_REGISTER_PLUGIN: &str = "register_wasm_plugin";
pub const TOOL_RUN_PLUGIN: &str = "run_plugin";
pub const TOOL_GET_PLUGIN_RESULT: &str = "get_plugin_result";

// ============================================================================
// Plugin Constants
// ============================================================================

/// 현재 정의된 유일한 산출물 종류
pub const PLUGIN_KIND_WASM_SKILL: &str = "wasm-skill";

/// 플러그인 소스 파일명
pub const PLUGIN_SOURCE_FILE: &str = "lib.rs";
