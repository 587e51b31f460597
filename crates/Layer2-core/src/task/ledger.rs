//! Task Ledger - 제출된 task 기록 파일
//!
//! `armory run`과 `armory result`는 서로 다른 프로세스이므로
//! 제출 기록은 manifest 옆의 `tasks.json`에 남깁니다.

use super::AsyncTask;
use armory_foundation::storage::JsonStore;
use armory_foundation::{Result, TASKS_FILE};
use std::path::{Path, PathBuf};

/// task 기록 파일 하나
#[derive(Debug, Clone)]
pub struct TaskLedger {
    store: JsonStore,
    file_name: String,
}

impl TaskLedger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(TASKS_FILE)
            .to_string();

        Self {
            store: JsonStore::new(dir),
            file_name,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.store.path(&self.file_name)
    }

    /// 기록 로드 - 파일이 없으면 빈 목록
    pub fn load(&self) -> Result<Vec<AsyncTask>> {
        Ok(self.store.read(&self.file_name)?.unwrap_or_default())
    }

    /// 전체 기록 교체 (원자적 쓰기)
    pub fn save(&self, tasks: &[AsyncTask]) -> Result<()> {
        self.store.write(&self.file_name, tasks)
    }
}
