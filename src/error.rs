//! 에러 타입 정의

use thiserror::Error;

/// 업로드 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("유효하지 않은 GIF 파일: {reason}")]
    InvalidFormat { reason: String },

    #[error("파일이 너무 큽니다: {chunks}개 청크 필요, 최대 {max}개 (49,980 바이트 이하의 GIF를 선택하세요)")]
    PayloadTooLarge { chunks: usize, max: usize },

    #[error("연결 실패: {0}")]
    Connection(String),

    #[error("알림 구독 실패 ({source_name}): {reason}")]
    Subscription {
        source_name: &'static str,
        reason: String,
    },

    #[error("전송 쓰기 실패: {0}")]
    TransportWrite(String),

    #[error("ACK 타임아웃: packet={index}, timeout={timeout_ms}ms")]
    AckTimeout { index: u8, timeout_ms: u64 },

    #[error("패킷 인덱스 범위 초과: index={index}, total={total}")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("설정 에러: {0}")]
    Config(String),
}

/// 세션 실패 상태에 기록되는 에러 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    InvalidFormat,
    PayloadTooLarge,
    Connection,
    Subscription,
    TransportWrite,
    AckTimeout,
    IndexOutOfRange,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Error::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Error::Connection(_) => ErrorKind::Connection,
            Error::Subscription { .. } => ErrorKind::Subscription,
            Error::TransportWrite(_) => ErrorKind::TransportWrite,
            Error::AckTimeout { .. } => ErrorKind::AckTimeout,
            Error::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
