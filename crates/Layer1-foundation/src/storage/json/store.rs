//! JSON 파일 저장소
//!
//! 디렉토리 하나에 묶인 JSON 파일 읽기/쓰기. 설정 파일과 task 기록이
//! 같은 방식으로 저장됩니다.

use crate::storage::atomic_write;
use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 설정 디렉토리 이름
const ARMORY_DIR: &str = "armory";
const PROJECT_DIR: &str = ".armory";

/// 디렉토리 단위 JSON 저장소
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.config/armory/`
    pub fn global() -> Result<Self> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join(ARMORY_DIR)))
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))
    }

    /// `<root>/.armory/`
    pub fn project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(PROJECT_DIR))
    }

    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self::project(cwd))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// 파일 읽기 - 없으면 `None`
    ///
    /// 파싱 실패는 `Config` 에러이며 경로를 포함합니다.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// 파일 교체 (디렉토리 생성 + 원자적 쓰기)
    ///
    /// 실패하면 `Persist` 에러이고 기존 파일은 그대로 남습니다.
    pub fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path(name);
        let content = serde_json::to_vec_pretty(value)?;
        std::fs::create_dir_all(&self.dir)
            .and_then(|_| atomic_write(&path, &content))
            .map_err(|e| Error::Persist(format!("Failed to write {}: {}", path.display(), e)))
    }
}
