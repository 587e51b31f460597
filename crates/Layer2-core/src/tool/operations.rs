//! Builtin operations - 호출 가능한 고정 도구 목록

use super::registry::OperationDescriptor;
use armory_foundation::strings::*;
use serde_json::json;

/// 엔드포인트 uuid 속성
fn uuid_property() -> serde_json::Value {
    json!({
        "type": SCHEMA_TYPE_STRING,
        "description": "Endpoint UUID"
    })
}

/// 모든 builtin 도구 (호출 표면 순서)
pub fn all_operations() -> Vec<OperationDescriptor> {
    vec![
        get_clients(),
        send_cmd(),
        list_plugins(),
        list_files(),
        list_processes(),
        get_history(),
        register_plugin(),
        run_plugin(),
        get_plugin_result(),
    ]
}

fn get_clients() -> OperationDescriptor {
    OperationDescriptor::new(
        TOOL_GET_CLIENTS,
        "List all endpoints currently connected to the backend",
        json!({ "type": SCHEMA_TYPE_OBJECT, "properties": {} }),
    )
}

fn send_cmd() -> OperationDescriptor {
    OperationDescriptor::new(
        TOOL_SEND_CMD,
        "Send a shell command to an endpoint",
        json!({
            "type": SCHEMA_TYPE_OBJECT,
            "properties": {
                "uuid": uuid_property(),
                "cmd": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "Command line to execute"
                }
            },
            "required": ["uuid", "cmd"]
        }),
    )
}

fn list_plugins() -> OperationDescriptor {
    OperationDescriptor::new(
        TOOL_LIST_PLUGINS,
        "List plugins available on the backend",
        json!({ "type": SCHEMA_TYPE_OBJECT, "properties": {} }),
    )
}

fn list_files() -> OperationDescriptor {
    OperationDescriptor::new(
        TOOL_LIST_FILES,
        "List files in a directory on an endpoint",
        json!({
            "type": SCHEMA_TYPE_OBJECT,
            "properties": {
                "uuid": uuid_property(),
                "path": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "Directory path (default: current directory)"
                }
            },
            "required": ["uuid"]
        }),
    )
}

fn list_processes() -> OperationDescriptor {
    OperationDescriptor::new(
        TOOL_LIST_PROCESSES,
        "List running processes on an endpoint",
        json!({
            "type": SCHEMA_TYPE_OBJECT,
            "properties": { "uuid": uuid_property() },
            "required": ["uuid"]
        }),
    )
}

fn get_history() -> OperationDescriptor {
    OperationDescriptor::new(
        TOOL_GET_HISTORY,
        "Get the command history of an endpoint",
        json!({
            "type": SCHEMA_TYPE_OBJECT,
            "properties": { "uuid": uuid_property() },
            "required": ["uuid"]
        }),
    )
}

fn register_plugin() -> OperationDescriptor {
    OperationDescriptor::new(
        TOOL_REGISTER_PLUGIN,
        "Compile Rust source into a WebAssembly plugin and register it in the plugin manifest. \
         The manifest is only updated when the build succeeds.",
        json!({
            "type": SCHEMA_TYPE_OBJECT,
            "properties": {
                "id": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "Unique plugin ID (e.g. port-scan). Letters, digits, '-' and '_' only."
                },
                "name": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "Display name"
                },
                "description": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "What the plugin does"
                },
                "rust_code": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "Rust source (contents of lib.rs)"
                },
                "category": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "Category (Discovery/Credential/Post-Ex)",
                    "default": "Discovery"
                },
                "params": {
                    "type": SCHEMA_TYPE_ARRAY,
                    "description": "Parameters the plugin accepts",
                    "items": {
                        "type": SCHEMA_TYPE_OBJECT,
                        "properties": {
                            "name": { "type": SCHEMA_TYPE_STRING },
                            "description": { "type": SCHEMA_TYPE_STRING },
                            "type": {
                                "type": SCHEMA_TYPE_STRING,
                                "enum": ["string", "int", "bool", "integer", "number", "boolean"]
                            },
                            "default": {
                                "type": [SCHEMA_TYPE_STRING, SCHEMA_TYPE_NUMBER, SCHEMA_TYPE_BOOLEAN]
                            }
                        },
                        "required": ["name", "type"]
                    }
                }
            },
            "required": ["id", "name", "description", "rust_code"]
        }),
    )
}

fn run_plugin() -> OperationDescriptor {
    OperationDescriptor::new(
        TOOL_RUN_PLUGIN,
        "Run a registered plugin on an endpoint. Returns a task_id immediately; \
         poll get_plugin_result for the output.",
        json!({
            "type": SCHEMA_TYPE_OBJECT,
            "properties": {
                "uuid": uuid_property(),
                "plugin_id": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "Plugin ID"
                },
                "args": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "Plugin arguments (a JSON string for wasm plugins)"
                }
            },
            "required": ["uuid", "plugin_id", "args"]
        }),
    )
}

fn get_plugin_result() -> OperationDescriptor {
    OperationDescriptor::new(
        TOOL_GET_PLUGIN_RESULT,
        "Fetch the result of a plugin run. Reports 'pending' while the task is still running.",
        json!({
            "type": SCHEMA_TYPE_OBJECT,
            "properties": {
                "task_id": {
                    "type": SCHEMA_TYPE_STRING,
                    "description": "Task ID returned by run_plugin"
                }
            },
            "required": ["task_id"]
        }),
    )
}
