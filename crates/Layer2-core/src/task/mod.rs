//! Async Task Bridge - 플러그인 실행 submit/poll
//!
//! 원격 엔드포인트에서의 실행 시간은 제한이 없으므로 동기 호출 대신
//! 제출 즉시 task id를 돌려주고, 결과는 호출자가 폴링합니다.
//!
//! - `submit` → `POST /api/plugins/run` → task id
//! - `fetch_result` → `GET /api/plugins/result/{id}`
//!   - 200: 완료 payload
//!   - 404 + 이 브릿지가 제출한 id: `Pending`
//!   - 404 + 모르는 id: `UnknownTask`
//!
//! 제출 기록은 `TaskLedger` 파일로 프로세스 간에 공유됩니다.

mod bridge;
mod ledger;

pub use bridge::{AsyncTask, TaskBridge, TaskStatus};
pub use ledger::TaskLedger;
