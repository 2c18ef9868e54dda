//! ACK 신호 슬롯
//!
//! 장치 알림은 패킷 번호를 담지 않으므로, 어떤 알림이든 "마지막 패킷 수신"으로
//! 간주한다. 슬롯은 최신 알림 하나만 보관하며 전송 직전에 비운다.
//! 늦게 도착한 이전 패킷의 알림이나 중복 알림은 구분할 수 없음.

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// 단일 슬롯 최신 알림 채널
#[derive(Debug, Default)]
pub struct AckSignal {
    latest: Mutex<Option<Bytes>>,
    notify: Notify,
}

impl AckSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 알림 도착 (전송 계층 태스크에서 호출)
    pub fn raise(&self, data: Bytes) {
        *self.latest.lock() = Some(data);
        self.notify.notify_waiters();
    }

    /// 슬롯 비우기, 남아 있던 알림 반환
    pub fn clear(&self) -> Option<Bytes> {
        self.latest.lock().take()
    }

    pub fn is_raised(&self) -> bool {
        self.latest.lock().is_some()
    }

    /// 알림이 올 때까지 대기 후 소비
    pub async fn wait(&self) -> Bytes {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(data) = self.clear() {
                return data;
            }

            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_pending_signal() {
        let signal = AckSignal::new();
        signal.raise(Bytes::from_static(b"\x01"));

        assert!(signal.is_raised());
        assert_eq!(signal.wait().await, Bytes::from_static(b"\x01"));
        assert!(!signal.is_raised());
    }

    #[tokio::test]
    async fn test_latest_wins() {
        let signal = AckSignal::new();
        signal.raise(Bytes::from_static(b"old"));
        signal.raise(Bytes::from_static(b"new"));

        assert_eq!(signal.wait().await, Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn test_clear_discards_stale_signal() {
        let signal = AckSignal::new();
        signal.raise(Bytes::from_static(b"stale"));
        assert_eq!(signal.clear(), Some(Bytes::from_static(b"stale")));

        let waited = tokio::time::timeout(Duration::from_millis(20), signal.wait()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_wakes_waiter_from_other_task() {
        let signal = Arc::new(AckSignal::new());
        let raiser = signal.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            raiser.raise(Bytes::from_static(b"ack"));
        });

        let data = tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .unwrap();
        assert_eq!(data, Bytes::from_static(b"ack"));
        handle.await.unwrap();
    }
}
