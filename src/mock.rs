//! 메모리 내 모의 전송 계층
//!
//! 실제 장치 없이 세션을 구동하기 위한 구현. 쓴 프레임과 구독/연결 이력을
//! `MockRecorder` 에 남기며, ACK 동작과 실패 지점을 설정할 수 있다.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::transport::{Connector, NotificationHandler, NotifySource, Transport};
use crate::{Error, Result};

/// 쓰기 후 알림 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// 쓰기마다 즉시 모든 구독자에게 알림
    Immediate,

    /// 처음 n번의 쓰기에만 알림
    FirstWrites(usize),

    /// 알림 없음
    Silent,
}

/// 모의 장치 동작 설정
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub ack_mode: AckMode,

    /// 연결 거부
    pub fail_connect: bool,

    /// 이 소스 구독 시 실패
    pub fail_subscription: Option<NotifySource>,

    /// n번째 쓰기(0부터)에서 실패
    pub fail_write_at: Option<usize>,

    /// 알림 페이로드
    pub ack_payload: Bytes,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            ack_mode: AckMode::Immediate,
            fail_connect: false,
            fail_subscription: None,
            fail_write_at: None,
            ack_payload: Bytes::from_static(&[0x00]),
        }
    }
}

impl MockBehavior {
    pub fn silent() -> Self {
        Self {
            ack_mode: AckMode::Silent,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct Record {
    connects: Vec<String>,
    subscriptions: Vec<NotifySource>,
    frames: Vec<(Bytes, bool)>,
    disconnects: usize,
}

/// 모의 전송 이력 (공유 핸들)
#[derive(Debug, Clone, Default)]
pub struct MockRecorder {
    inner: Arc<Mutex<Record>>,
}

impl MockRecorder {
    /// 쓰여진 모든 프레임
    pub fn frames(&self) -> Vec<Bytes> {
        self.inner.lock().frames.iter().map(|(f, _)| f.clone()).collect()
    }

    /// 응답 요구 쓰기 여부 포함 프레임
    pub fn writes(&self) -> Vec<(Bytes, bool)> {
        self.inner.lock().frames.clone()
    }

    pub fn subscriptions(&self) -> Vec<NotifySource> {
        self.inner.lock().subscriptions.clone()
    }

    pub fn connects(&self) -> Vec<String> {
        self.inner.lock().connects.clone()
    }

    pub fn disconnect_count(&self) -> usize {
        self.inner.lock().disconnects
    }
}

/// 모의 연결
pub struct MockTransport {
    behavior: MockBehavior,
    recorder: MockRecorder,
    handlers: Vec<(NotifySource, NotificationHandler)>,
    writes: usize,
    connected: bool,
}

impl MockTransport {
    pub fn new(behavior: MockBehavior) -> Self {
        Self::with_recorder(behavior, MockRecorder::default())
    }

    fn with_recorder(behavior: MockBehavior, recorder: MockRecorder) -> Self {
        Self {
            behavior,
            recorder,
            handlers: Vec::new(),
            writes: 0,
            connected: true,
        }
    }

    pub fn recorder(&self) -> MockRecorder {
        self.recorder.clone()
    }

    /// 모든 구독자에게 알림 전달
    pub fn notify(&self, data: Bytes) {
        for (_, handler) in &self.handlers {
            handler(data.clone());
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn subscribe(&mut self, source: NotifySource, handler: NotificationHandler) -> Result<()> {
        if self.behavior.fail_subscription == Some(source) {
            return Err(Error::Subscription {
                source_name: source.name(),
                reason: "mock: 구독 거부".to_string(),
            });
        }

        self.recorder.inner.lock().subscriptions.push(source);
        self.handlers.push((source, handler));
        Ok(())
    }

    async fn write(&mut self, frame: &[u8], expect_response: bool) -> Result<()> {
        if !self.connected {
            return Err(Error::TransportWrite("mock: 연결 끊김".to_string()));
        }

        let attempt = self.writes;
        self.writes += 1;
        if self.behavior.fail_write_at == Some(attempt) {
            return Err(Error::TransportWrite(format!("mock: {}번째 쓰기 실패", attempt)));
        }

        self.recorder
            .inner
            .lock()
            .frames
            .push((Bytes::copy_from_slice(frame), expect_response));

        let ack = match self.behavior.ack_mode {
            AckMode::Immediate => true,
            AckMode::FirstWrites(n) => attempt < n,
            AckMode::Silent => false,
        };
        if ack {
            self.notify(self.behavior.ack_payload.clone());
        }

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        self.handlers.clear();
        self.recorder.inner.lock().disconnects += 1;
        Ok(())
    }
}

/// 모의 연결 생성기
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    behavior: MockBehavior,
    recorder: MockRecorder,
}

impl MockConnector {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            recorder: MockRecorder::default(),
        }
    }

    pub fn recorder(&self) -> MockRecorder {
        self.recorder.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self, address: &str) -> Result<MockTransport> {
        if self.behavior.fail_connect {
            return Err(Error::Connection(format!("mock: {} 에 연결할 수 없음", address)));
        }

        self.recorder.inner.lock().connects.push(address.to_string());
        Ok(MockTransport::with_recorder(
            self.behavior.clone(),
            self.recorder.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(counter: Arc<AtomicUsize>) -> NotificationHandler {
        Arc::new(move |_: Bytes| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_immediate_ack_reaches_all_subscribers() {
        let mut transport = MockTransport::new(MockBehavior::default());
        let counter = Arc::new(AtomicUsize::new(0));

        for source in NotifySource::ALL {
            transport
                .subscribe(source, counting_handler(counter.clone()))
                .await
                .unwrap();
        }
        transport.write(b"frame", false).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(transport.recorder().frames(), vec![Bytes::from_static(b"frame")]);
    }

    #[tokio::test]
    async fn test_silent_and_failures() {
        let behavior = MockBehavior {
            fail_write_at: Some(1),
            ..MockBehavior::silent()
        };
        let mut transport = MockTransport::new(behavior);
        let counter = Arc::new(AtomicUsize::new(0));
        transport
            .subscribe(NotifySource::Notifications, counting_handler(counter.clone()))
            .await
            .unwrap();

        transport.write(b"one", false).await.unwrap();
        assert!(matches!(
            transport.write(b"two", false).await,
            Err(Error::TransportWrite(_))
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        transport.disconnect().await.unwrap();
        assert!(transport.write(b"three", false).await.is_err());
        assert_eq!(transport.recorder().disconnect_count(), 1);
    }

    #[tokio::test]
    async fn test_connector_shares_recorder() {
        let connector = MockConnector::new(MockBehavior::default());
        let mut transport = connector.connect("AA:BB").await.unwrap();
        transport.write(b"x", true).await.unwrap();

        let recorder = connector.recorder();
        assert_eq!(recorder.connects(), vec!["AA:BB".to_string()]);
        assert_eq!(recorder.writes(), vec![(Bytes::from_static(b"x"), true)]);

        let refused = MockConnector::new(MockBehavior {
            fail_connect: true,
            ..MockBehavior::default()
        });
        assert!(matches!(
            refused.connect("AA:BB").await,
            Err(Error::Connection(_))
        ));
    }
}
