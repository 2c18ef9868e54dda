//! 업로드 세션 (송신측)
//!
//! - 리셋: erase / prepare 제어 프레임 + 안정화 대기
//! - 전송: 패킷 하나씩 쓰고 ACK 대기 (stop-and-wait)
//! - 종료: finalize 프레임 두 번
//!
//! 모든 실패는 즉시 세션 전체를 중단한다. 재시도 없음.

use std::sync::Arc;

use bytes::Bytes;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::chunk::TransferPlan;
use crate::config::FINALIZE_REPEAT;
use crate::packet::{encode_packet, ControlFrame};
use crate::signal::AckSignal;
use crate::stats::UploadStats;
use crate::transport::{Connector, NotificationHandler, NotifySource, Transport};
use crate::{Config, Error, ErrorKind, Result};

/// 세션 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,

    /// 두 알림 소스 구독 완료
    Connected,

    /// 장치의 기존 애니메이션 삭제 중
    Resetting,

    /// i번 패킷 전송/ACK 대기 중
    Transferring(u8),

    /// 종료 프레임 전송 중
    Finalizing,

    Completed,

    Failed(ErrorKind),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed(_))
    }
}

/// 업로드 세션
///
/// 연결(전송 계층)을 소유하며 한 번의 업로드에만 사용한다.
pub struct UploadSession<T: Transport> {
    /// 연결
    transport: T,

    /// 설정
    config: Config,

    /// ACK 슬롯 (알림 핸들러와 공유)
    signal: Arc<AckSignal>,

    /// 현재 상태
    state: SessionState,

    /// 상태 전이 기록
    history: Vec<SessionState>,
}

impl<T: Transport> UploadSession<T> {
    /// 새 세션 생성
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport,
            config,
            signal: Arc::new(AckSignal::new()),
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Idle 부터 지금까지 거쳐 온 상태들
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// 실패 직전 상태 (실패하지 않았으면 None)
    pub fn failed_stage(&self) -> Option<SessionState> {
        match self.history.as_slice() {
            [.., stage, SessionState::Failed(_)] => Some(*stage),
            _ => None,
        }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// 업로드 실행
    pub async fn run(&mut self, plan: &TransferPlan) -> Result<UploadStats> {
        let mut stats = UploadStats::new(plan.chunks().len(), plan.payload_len());

        match self.drive(plan, &mut stats).await {
            Ok(()) => {
                stats.finish();
                info!("Upload complete: {}", stats.summary());
                Ok(stats)
            }
            Err(e) => {
                self.transition(SessionState::Failed(e.kind()));
                match self.failed_stage() {
                    Some(stage) => warn!("Upload aborted in {:?}: {}", stage, e),
                    None => warn!("Upload aborted: {}", e),
                }
                Err(e)
            }
        }
    }

    async fn drive(&mut self, plan: &TransferPlan, stats: &mut UploadStats) -> Result<()> {
        self.subscribe().await?;
        self.reset(stats).await?;
        self.transfer(plan, stats).await?;
        self.finalize(stats).await?;
        self.transition(SessionState::Completed);
        Ok(())
    }

    /// Idle -> Connected
    async fn subscribe(&mut self) -> Result<()> {
        for source in NotifySource::ALL {
            let signal = self.signal.clone();
            let handler: NotificationHandler = Arc::new(move |data: Bytes| signal.raise(data));

            self.transport
                .subscribe(source, handler)
                .await
                .map_err(|e| match e {
                    Error::Subscription { .. } => e,
                    other => Error::Subscription {
                        source_name: source.name(),
                        reason: other.to_string(),
                    },
                })?;
            debug!("Subscribed to {}", source);
        }

        self.transition(SessionState::Connected);
        Ok(())
    }

    /// Connected -> Resetting
    async fn reset(&mut self, stats: &mut UploadStats) -> Result<()> {
        self.transition(SessionState::Resetting);

        for frame in [ControlFrame::Erase, ControlFrame::Prepare] {
            self.send_control(frame, stats).await?;
            tokio::time::sleep(self.config.reset_settle()).await;
        }

        Ok(())
    }

    /// Transferring(0) ..= Transferring(N-1)
    async fn transfer(&mut self, plan: &TransferPlan, stats: &mut UploadStats) -> Result<()> {
        let total = plan.chunks().len();
        let timeout = self.config.ack_timeout();
        let log_interval = self.config.progress_log_interval.max(1);

        info!(
            "Uploading {} packets (~{} bytes)",
            total,
            plan.padded_len()
        );

        for (index, chunk) in plan.chunks().iter().enumerate() {
            self.transition(SessionState::Transferring(index as u8));

            let packet = encode_packet(chunk, index, total)?;

            // 이전 프레임에 대한 늦은 알림을 이번 ACK 로 착각하지 않도록
            if let Some(stale) = self.signal.clear() {
                debug!("Dropped stale notification before packet {}: {:02X?}", index, &stale[..]);
            }

            self.write(packet.as_bytes()).await?;
            stats.record_packet(packet.len());
            let sent_at = Instant::now();

            match tokio::time::timeout(timeout, self.signal.wait()).await {
                Ok(ack) => {
                    let latency = sent_at.elapsed();
                    stats.record_ack(latency);
                    debug!(
                        "Packet {}/{} acked in {:?} ({:02X?})",
                        index + 1,
                        total,
                        latency,
                        &ack[..]
                    );
                }
                Err(_) => {
                    return Err(Error::AckTimeout {
                        index: index as u8,
                        timeout_ms: self.config.ack_timeout_ms,
                    });
                }
            }

            if (index + 1) % log_interval == 0 || index + 1 == total {
                info!(
                    "Progress: packet {}/{} ({:.1}%)",
                    index + 1,
                    total,
                    stats.progress() * 100.0
                );
            }
        }

        Ok(())
    }

    /// Finalizing
    async fn finalize(&mut self, stats: &mut UploadStats) -> Result<()> {
        self.transition(SessionState::Finalizing);

        for _ in 0..self.config.finalize_repeat.max(FINALIZE_REPEAT) {
            self.send_control(ControlFrame::Finalize, stats).await?;
        }

        Ok(())
    }

    async fn send_control(&mut self, frame: ControlFrame, stats: &mut UploadStats) -> Result<()> {
        let bytes = frame.as_bytes();
        self.write(bytes).await?;
        stats.record_control(bytes.len());
        debug!("Sent {} frame ({} bytes)", frame.name(), bytes.len());
        Ok(())
    }

    async fn write(&mut self, frame: &[u8]) -> Result<()> {
        self.transport
            .write(frame, self.config.write_with_response)
            .await
            .map_err(|e| match e {
                Error::TransportWrite(_) => e,
                other => Error::TransportWrite(other.to_string()),
            })
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}

/// 페이로드 검증 후 연결, 업로드, 연결 해제
///
/// 검증 실패(시그니처, 크기)는 연결 전에 반환된다.
pub async fn upload<C: Connector>(connector: &C, config: &Config, payload: &[u8]) -> Result<UploadStats> {
    let plan = TransferPlan::from_payload(payload)?;
    upload_plan(connector, config, &plan).await
}

/// 준비된 전송 계획으로 업로드. 연결은 성공/실패 모두 해제됨
pub async fn upload_plan<C: Connector>(
    connector: &C,
    config: &Config,
    plan: &TransferPlan,
) -> Result<UploadStats> {
    info!("Connecting to {}", config.device_address);

    let transport = connector
        .connect(&config.device_address)
        .await
        .map_err(|e| match e {
            Error::Connection(_) => e,
            other => Error::Connection(other.to_string()),
        })?;
    info!("Connected to {}", config.device_address);

    let mut session = UploadSession::new(transport, config.clone());
    let result = session.run(plan).await;

    let mut transport = session.into_transport();
    if let Err(e) = transport.disconnect().await {
        warn!("Disconnect failed: {}", e);
    }

    result
}
