//! Manifest Store - manifest.json 관리
//!
//! 등록된 플러그인 디스크립터 목록을 파일 하나(JSON 배열)에 저장합니다.
//!
//! ## 동시성
//! - 같은 경로의 read-modify-write는 프로세스 전역 잠금으로 직렬화됩니다.
//!   (같은 파일을 가리키는 `ManifestStore`가 여러 개여도 잠금을 공유)
//! - 잠금은 load → 수정 → persist 구간에서만 잡습니다.
//! - 파일 교체는 임시 파일 + rename 이라서 읽는 쪽은 항상 완전한
//!   이전 상태 또는 완전한 새 상태만 봅니다.

use super::manifest::PluginDescriptor;
use armory_foundation::{atomic_write, Error, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 경로별 manifest 잠금 테이블
fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

    let table = LOCKS.get_or_init(|| std::sync::Mutex::new(HashMap::new()));
    let mut table = table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(
        table
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(()))),
    )
}

/// upsert 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 새 ID 추가
    Inserted,
    /// 같은 ID의 기존 항목을 통째로 교체
    Replaced,
}

// ============================================================================
// ManifestStore
// ============================================================================

/// 파일 기반 플러그인 manifest 저장소
pub struct ManifestStore {
    /// manifest.json 경로
    path: PathBuf,

    /// read-modify-write 잠금
    lock: Arc<Mutex<()>>,
}

impl ManifestStore {
    /// 새 저장소 생성
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = lock_for(&path);
        Self { path, lock }
    }

    /// manifest.json 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 산출물 디렉토리 (manifest와 같은 디렉토리)
    pub fn artifact_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// manifest 로드
    ///
    /// 파일이 없으면 빈 목록입니다. 잘 구성된 디스크립터 배열로
    /// 파싱되지 않으면 `CorruptManifest`.
    pub async fn load(&self) -> Result<Vec<PluginDescriptor>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("manifest not found at {:?}, using empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        parse_manifest(&content)
            .map_err(|e| Error::CorruptManifest(format!("{}: {}", self.path.display(), e)))
    }

    /// ID로 디스크립터 조회
    pub async fn get(&self, id: &str) -> Result<Option<PluginDescriptor>> {
        Ok(self.load().await?.into_iter().find(|p| p.id == id))
    }

    /// 플러그인 존재 여부
    pub async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    // ========================================================================
    // 쓰기
    // ========================================================================

    /// 같은 ID의 항목을 제거하고 새 항목을 끝에 추가한 뒤 전체를 원자적으로 저장
    ///
    /// 필드 단위 병합은 하지 않습니다. 실패 시 이전 manifest는 그대로입니다.
    pub async fn upsert(&self, descriptor: PluginDescriptor) -> Result<UpsertOutcome> {
        let _guard = self.lock.lock().await;

        // 손상된 manifest를 빈 목록으로 덮어쓰지 않음
        let mut plugins = self.load().await?;

        let before = plugins.len();
        plugins.retain(|p| p.id != descriptor.id);
        let outcome = if plugins.len() < before {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        };

        let id = descriptor.id.clone();
        plugins.push(descriptor);

        self.persist(&plugins).await?;

        match outcome {
            UpsertOutcome::Inserted => info!("Registered plugin '{}' in manifest", id),
            UpsertOutcome::Replaced => info!("Replaced plugin '{}' in manifest", id),
        }
        Ok(outcome)
    }

    /// 전체 목록 저장 (호출자가 잠금을 잡고 있어야 함)
    async fn persist(&self, plugins: &[PluginDescriptor]) -> Result<()> {
        let content = serde_json::to_string_pretty(plugins)
            .map_err(|e| Error::Persist(format!("Failed to serialize manifest: {}", e)))?;

        let dir = self.artifact_dir();
        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Persist(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&path, content.as_bytes()))
            .await
            .map_err(|e| Error::Persist(format!("Persist task failed: {}", e)))?
            .map_err(|e| {
                warn!("Failed to write manifest {:?}: {}", self.path, e);
                Error::Persist(format!("Failed to write {}: {}", self.path.display(), e))
            })?;

        debug!("Saved manifest with {} plugins", plugins.len());
        Ok(())
    }
}

fn parse_manifest(content: &str) -> serde_json::Result<Vec<PluginDescriptor>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(content)
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_store() -> (ManifestStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = ManifestStore::new(temp.path().join("plugins").join("manifest.json"));
        (store, temp)
    }

    #[tokio::test]
    async fn test_missing_manifest_is_empty() {
        let (store, _temp) = test_store();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_array_is_tolerated() {
        let (store, _temp) = test_store();
        std::fs::create_dir_all(store.artifact_dir()).unwrap();
        std::fs::write(store.path(), "[]").unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_inserts() {
        let (store, _temp) = test_store();

        let outcome = store
            .upsert(PluginDescriptor::new("port-scan", "Port Scan"))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert!(store.contains("port-scan").await.unwrap());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_upsert_replaces_wholesale() {
        let (store, _temp) = test_store();

        store
            .upsert(
                PluginDescriptor::new("port-scan", "Port Scan")
                    .with_description("v1")
                    .with_category("Credential"),
            )
            .await
            .unwrap();
        store
            .upsert(PluginDescriptor::new("other", "Other"))
            .await
            .unwrap();

        let outcome = store
            .upsert(PluginDescriptor::new("port-scan", "Port Scan 2").with_description("v2"))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Replaced);

        let plugins = store.load().await.unwrap();
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins.iter().filter(|p| p.id == "port-scan").count(), 1);

        // 교체된 항목은 뒤로 이동하고 값은 새 것으로 전부 바뀜
        let replaced = &plugins[1];
        assert_eq!(replaced.id, "port-scan");
        assert_eq!(replaced.name, "Port Scan 2");
        assert_eq!(replaced.description, "v2");
        assert_eq!(replaced.category.as_str(), "Discovery");
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_reported_and_not_overwritten() {
        let (store, _temp) = test_store();
        std::fs::create_dir_all(store.artifact_dir()).unwrap();
        std::fs::write(store.path(), "{\"not\": \"an array\"}").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::CorruptManifest(_)));

        let err = store
            .upsert(PluginDescriptor::new("x", "X"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CorruptManifest(_)));
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "{\"not\": \"an array\"}"
        );
    }

    #[tokio::test]
    async fn test_persist_failure_is_persist_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = ManifestStore::new(blocker.join("manifest.json"));
        let err = store
            .upsert(PluginDescriptor::new("x", "X"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Persist(_)), "got {:?}", err);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_persist_keeps_existing_manifest() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp) = test_store();
        store
            .upsert(PluginDescriptor::new("port-scan", "Port Scan"))
            .await
            .unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let dir = store.artifact_dir();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();

        // root는 권한을 무시하므로 쓰기가 실제로 막히는지 먼저 확인
        let writable = std::fs::write(dir.join(".write-check"), b"").is_ok();
        if writable {
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = store.upsert(PluginDescriptor::new("whoami", "Whoami")).await;
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Persist(_)), "got {:?}", err);
        assert_eq!(std::fs::read(store.path()).unwrap(), before);

        let plugins = store.load().await.unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].id, "port-scan");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_of_different_ids() {
        let (store, _temp) = test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .upsert(PluginDescriptor::new(format!("plugin-{}", i), "P"))
                        .await
                })
            })
            .collect();

        for handle in futures::future::join_all(handles).await {
            handle.unwrap().unwrap();
        }

        let plugins = store.load().await.unwrap();
        assert_eq!(plugins.len(), 16);
        for i in 0..16 {
            let id = format!("plugin-{}", i);
            assert_eq!(plugins.iter().filter(|p| p.id == id).count(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_of_same_id() {
        let (store, _temp) = test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .upsert(
                            PluginDescriptor::new("port-scan", "Port Scan")
                                .with_description(format!("writer-{}", i)),
                        )
                        .await
                })
            })
            .collect();

        for handle in futures::future::join_all(handles).await {
            handle.unwrap().unwrap();
        }

        let plugins = store.load().await.unwrap();
        assert_eq!(plugins.len(), 1);
        assert!(plugins[0].description.starts_with("writer-"));
    }

    #[tokio::test]
    async fn test_stores_on_same_path_share_lock() {
        let (store, _temp) = test_store();
        let other = ManifestStore::new(store.path());
        assert!(Arc::ptr_eq(&store.lock, &other.lock));
    }
}
