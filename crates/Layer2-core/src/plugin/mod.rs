//! # Plugin System
//!
//! 런타임에 백엔드 기능을 확장하는 플러그인 등록 시스템
//!
//! ## 아키텍처
//!
//! ```text
//! RegisterRequest
//!       │ validate
//!       ▼
//! <skillsDir>/<id>/lib.rs ──► BuildInvoker ──► <id>.wasm
//!                                                  │
//!                                                  ▼
//!                                 ManifestStore::upsert (manifest.json)
//! ```
//!
//! manifest는 "실행 가능한 플러그인"의 유일한 기준이고,
//! 산출물이 존재한다는 것이 확인된 뒤에만 갱신됩니다.

mod manifest;
mod registration;
mod store;

pub use manifest::{
    artifact_file_name, ParamType, PluginCategory, PluginDescriptor, PluginKind, PluginParam,
};
pub use registration::{is_safe_plugin_id, RegisterRequest, Registration, RegistrationPipeline};
pub use store::{ManifestStore, UpsertOutcome};
