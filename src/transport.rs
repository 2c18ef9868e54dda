//! 전송 계층 추상화
//!
//! 세션은 라디오를 직접 다루지 않고 이 트레이트만 사용한다.
//! 구현체: `ble::BleConnector` (btleplug), `mock::MockConnector` (테스트용)

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use crate::Result;

/// 알림 콜백 (전송 계층 태스크에서 호출됨)
pub type NotificationHandler = Arc<dyn Fn(Bytes) + Send + Sync>;

/// 구독 대상 알림 소스
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifySource {
    /// 장치 상태 indication
    Indications,

    /// 데이터 채널 알림
    Notifications,
}

impl NotifySource {
    pub const ALL: [NotifySource; 2] = [NotifySource::Indications, NotifySource::Notifications];

    pub fn name(&self) -> &'static str {
        match self {
            NotifySource::Indications => "indications",
            NotifySource::Notifications => "notifications",
        }
    }
}

impl fmt::Display for NotifySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 연결된 장치에 대한 쓰기/알림 기능
#[async_trait]
pub trait Transport: Send {
    /// 알림 소스 구독
    async fn subscribe(&mut self, source: NotifySource, handler: NotificationHandler) -> Result<()>;

    /// 쓰기 특성에 프레임 전송
    async fn write(&mut self, frame: &[u8], expect_response: bool) -> Result<()>;

    /// 연결 해제
    async fn disconnect(&mut self) -> Result<()>;
}

/// 장치 연결 생성기
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    async fn connect(&self, address: &str) -> Result<Self::Transport>;
}

/// 연결 직후 설정 단계가 실패하면 연결을 끊고 원래 에러를 그대로 반환
///
/// 연결 해제 실패는 로그만 남긴다.
pub async fn release_on_error<T, D, F>(result: Result<T>, disconnect: D) -> Result<T>
where
    D: FnOnce() -> F,
    F: Future<Output = Result<()>>,
{
    if let Err(e) = &result {
        warn!("Connection setup failed, disconnecting: {}", e);
        if let Err(disconnect_err) = disconnect().await {
            warn!("Disconnect after failed setup failed: {}", disconnect_err);
        }
    }
    result
}
