//! Remote Backend - C2 백엔드 HTTP 경계
//!
//! 백엔드는 소비만 하는 외부 협력자입니다. 이 모듈은 요청/응답을
//! 전달하는 얇은 계층이고, 응답 해석은 호출자(TaskBridge, Dispatcher)가 합니다.
//!
//! - `RemoteBackend`: 테스트에서 fake로 교체 가능한 경계 트레이트
//! - `HttpBackend`: reqwest 구현 (Bearer 인증 + JSON)

mod http;

pub use http::HttpBackend;

use armory_foundation::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;

/// HTTP 메서드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// 백엔드 요청
///
/// 경로는 세그먼트 단위로 보관하고 URL 인코딩은 전송 계층이 맡습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RemoteRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
            query: Vec::new(),
            body: None,
        }
    }

    /// GET 요청 (`path`는 `api/clients` 형태)
    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    /// POST 요청 (JSON 본문)
    pub fn post(path: &str, body: Value) -> Self {
        let mut request = Self::new(Method::Post, path);
        request.body = Some(body);
        request
    }

    /// 경로 세그먼트 추가 (값 그대로, 인코딩은 전송 시)
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// 쿼리 파라미터 추가
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// 로그용 경로 (`/api/plugins/result/T42`)
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// 백엔드 응답 - 상태 코드와 원문 본문
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReply {
    pub status: u16,
    pub body: String,
}

impl RemoteReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// 성공이면 본문, 아니면 상태/본문을 담은 `Remote` 에러
    pub fn into_text(self) -> Result<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(Error::remote(Some(self.status), self.body))
        }
    }
}

/// 원격 백엔드 트레이트
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// 요청 전송
    ///
    /// 전송 자체가 실패한 경우에만 `Err` (`Remote { status: None }`).
    /// 2xx가 아닌 응답도 `Ok(RemoteReply)`로 돌려줍니다.
    async fn send(&self, request: RemoteRequest) -> Result<RemoteReply>;
}

// ============================================================================
// 테스트용 fake
// ============================================================================

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// 경로별로 미리 정한 응답을 돌려주고 요청을 기록하는 백엔드
    #[derive(Default)]
    pub struct FakeBackend {
        replies: Mutex<HashMap<String, VecDeque<RemoteReply>>>,
        requests: Mutex<Vec<RemoteRequest>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// `path`에 대한 응답을 순서대로 쌓음 (마지막 응답은 반복)
        pub fn reply(&self, path: &str, status: u16, body: &str) {
            self.replies
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default()
                .push_back(RemoteReply::new(status, body));
        }

        pub fn requests(&self) -> Vec<RemoteRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteBackend for FakeBackend {
        async fn send(&self, request: RemoteRequest) -> Result<RemoteReply> {
            let path = request.path();
            self.requests.lock().unwrap().push(request);

            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&path) {
                Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
                Some(queue) if !queue.is_empty() => Ok(queue[0].clone()),
                _ => Err(Error::remote(None, format!("no route for {}", path))),
            }
        }
    }
}
