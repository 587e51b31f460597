//! Atomic file replacement
//!
//! 임시 파일에 전부 쓴 뒤 rename으로 교체합니다.
//! 읽는 쪽은 이전 내용 전체 또는 새 내용 전체만 보게 됩니다.

use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;

/// `path`의 내용을 `contents`로 원자적으로 교체
///
/// 데이터는 같은 디렉토리의 임시 파일에 기록되고 fsync된 뒤 제자리로
/// rename 됩니다. 어느 단계에서 실패해도 기존 파일은 건드리지 않으며
/// 임시 파일은 drop 시 삭제됩니다.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| format!(".{}.", name))
        .unwrap_or_else(|| ".armory.".to_string());

    let mut file = Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
