//! # ledgif
//!
//! BLE 96x20 LED 매트릭스용 GIF 업로드 프로토콜 엔진
//!
//! ## 핵심 특징
//! - **고정 크기 청크**: 196바이트 단위 분할, 마지막 청크는 0 패딩
//! - **체크섬 트레일러**: mod-256 체크섬 + 합계 상위 바이트
//! - **Stop-and-wait**: 패킷 하나 전송 후 알림(ACK) 대기
//! - **Fail-fast**: 타임아웃/쓰기 실패 시 즉시 전체 중단, 재시도 없음
//! - **전송 계층 분리**: `Transport` 트레이트로 BLE/모의 백엔드 교체

pub mod checksum;
pub mod chunk;
pub mod config;
pub mod error;
pub mod mock;
pub mod packet;
pub mod payload;
pub mod session;
pub mod signal;
pub mod stats;
pub mod transport;

#[cfg(feature = "ble")]
pub mod ble;

pub use chunk::{split_into_chunks, Chunk, TransferPlan};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use packet::{encode_packet, ControlFrame, Packet};
pub use payload::{read_payload, PayloadFormat};
pub use session::{upload, upload_plan, SessionState, UploadSession};
pub use signal::AckSignal;
pub use stats::UploadStats;
pub use transport::{Connector, NotificationHandler, NotifySource, Transport};

/// 청크 크기 (바이트)
pub const CHUNK_SIZE: usize = 196;

/// 최대 청크(패킷) 수 - 헤더의 인덱스/개수 필드가 1바이트
pub const MAX_CHUNKS: usize = 255;

/// 업로드 가능한 최대 페이로드 크기 (49,980 바이트)
pub const MAX_PAYLOAD_SIZE: usize = CHUNK_SIZE * MAX_CHUNKS;

/// 모든 프레임의 시작 마커
pub const FRAME_MARKER: [u8; 4] = [0xAA, 0x55, 0xFF, 0xFF];
