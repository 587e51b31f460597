//! Storage module for Armory
//!
//! - `json`: JSON - 범용 파일 저장/로드
//! - `atomic`: 임시 파일 + rename 기반 원자적 교체

mod atomic;
mod json;

pub use atomic::atomic_write;
pub use json::JsonStore;
