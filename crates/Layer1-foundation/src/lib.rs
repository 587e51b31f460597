//! # armory-foundation
//!
//! Foundation layer for Armory:
//! - Error: 공통 에러 타입 (`Error`, `Result`)
//! - Config: 백엔드/경로/빌드 설정 (`BridgeConfig`)
//! - Storage: JSON 파일 저장소 + 원자적 파일 교체
//! - Strings: 도구 이름, 스키마 타입 상수
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Layer3-cli   (MCP stdio / direct-call front-ends)   │
//! ├──────────────────────────────────────────────────────┤
//! │  Layer2-core  (Dispatcher, Registration, Task Bridge)│
//! ├──────────────────────────────────────────────────────┤
//! │  Layer1-foundation (이 레이어)                        │
//! │  ├── Error / Result                                  │
//! │  ├── BridgeConfig                                    │
//! │  └── JsonStore, atomic_write                         │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod storage;
pub mod strings;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    BackendConfig, BridgeConfig, BuildConfig, PathsConfig, PluginDefaults, ARMORY_CONFIG_FILE,
    ENV_API_TOKEN, ENV_BACKEND_URL, ENV_WORKSPACE, TASKS_FILE,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{atomic_write, JsonStore};
