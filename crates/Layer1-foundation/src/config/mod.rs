//! Config - 통합 설정 관리
//!
//! - `bridge.rs` - BridgeConfig (백엔드, 경로, 빌드, 플러그인 기본값)

mod bridge;

pub use bridge::{
    BackendConfig, BridgeConfig, BuildConfig, PathsConfig, PluginDefaults, ARMORY_CONFIG_FILE,
    ENV_API_TOKEN, ENV_BACKEND_URL, ENV_WORKSPACE, TASKS_FILE,
};
