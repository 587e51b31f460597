//! Tool System - 호출 가능한 도구 선언
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  ToolSchemaRegistry                              │
//! │  ├── list_operations() - 기능 탐색               │
//! │  └── validate(name, args) - jsonschema 검증      │
//! ├──────────────────────────────────────────────────┤
//! │  operations - builtin 도구 9종 선언              │
//! └──────────────────────────────────────────────────┘
//! ```

mod operations;
mod registry;

pub use registry::{OperationDescriptor, ToolSchemaRegistry};
