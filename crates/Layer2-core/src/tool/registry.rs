//! Tool Schema Registry - 호출 가능한 도구 선언
//!
//! 상태가 없는 선언 목록입니다. Dispatcher가 호출 전 검증에,
//! 프론트엔드가 기능 탐색(`tools/list`)에 사용합니다.

use super::operations;
use armory_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use jsonschema::Validator;
use serde_json::{Map, Value};

/// 도구 하나의 이름, 설명, 인자 스키마
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub name: String,

    pub description: String,

    /// 입력 스키마 (JSON Schema)
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl OperationDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// 스키마상 필수 인자 이름
    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// 도구 스키마 레지스트리
///
/// 각 도구의 입력 스키마는 생성 시 한 번 컴파일됩니다.
pub struct ToolSchemaRegistry {
    operations: Vec<OperationDescriptor>,
    validators: Vec<Validator>,
}

impl ToolSchemaRegistry {
    /// 도구 목록으로 생성 (스키마 컴파일 실패는 `Internal`)
    pub fn new(operations: Vec<OperationDescriptor>) -> Result<Self> {
        let validators = operations
            .iter()
            .map(|op| {
                jsonschema::draft202012::options()
                    .build(&op.input_schema)
                    .map_err(|e| {
                        Error::Internal(format!("Schema for '{}' does not compile: {}", op.name, e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            operations,
            validators,
        })
    }

    /// builtin 도구 9종으로 생성
    pub fn builtin() -> Result<Self> {
        Self::new(operations::all_operations())
    }

    /// 도구 목록 (선언 순서)
    pub fn list_operations(&self) -> Vec<OperationDescriptor> {
        self.operations.clone()
    }

    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// 인자 검증
    ///
    /// 모르는 이름은 `UnknownOperation`, 구조가 안 맞으면 `Validation`.
    /// `null` 인자는 빈 객체로, 값이 `null`인 최상위 키는 생략된 것으로 취급합니다.
    pub fn validate(&self, name: &str, args: &Value) -> Result<()> {
        let (_, validator) = self
            .operations
            .iter()
            .zip(&self.validators)
            .find(|(op, _)| op.name == name)
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))?;

        let args = without_null_fields(args);
        let problems: Vec<String> = validator
            .iter_errors(&args)
            .map(|e| format!("{}: {}", dotted_path(&e.instance_path.to_string()), e))
            .collect();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "Invalid arguments for '{}': {}",
                name,
                problems.join("; ")
            )))
        }
    }
}

impl std::fmt::Debug for ToolSchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.operations.iter().map(|op| op.name.as_str()).collect();
        f.debug_struct("ToolSchemaRegistry")
            .field("operations", &names)
            .finish()
    }
}

fn without_null_fields(args: &Value) -> Value {
    match args {
        Value::Null => Value::Object(Map::new()),
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// JSON pointer (`/params/0/type`) → `arguments.params[0].type`
fn dotted_path(pointer: &str) -> String {
    let mut path = String::from("arguments");
    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if segment.chars().all(|c| c.is_ascii_digit()) {
            path.push_str(&format!("[{}]", segment));
        } else {
            path.push('.');
            path.push_str(&segment);
        }
    }
    path
}
