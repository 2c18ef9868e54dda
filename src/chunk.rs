//! 청크와 전송 계획 정의
//!
//! - Chunk: 196바이트 고정 크기 조각, 마지막 조각은 0으로 패딩
//! - TransferPlan: 순서가 정해진 청크 목록 (최대 255개)

use bytes::Bytes;

use crate::payload::PayloadFormat;
use crate::{Error, Result, CHUNK_SIZE, MAX_CHUNKS};

/// 청크 (패킷 하나의 페이로드)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Bytes,
}

impl Chunk {
    /// 슬라이스를 CHUNK_SIZE 까지 0으로 패딩해 청크 생성
    ///
    /// CHUNK_SIZE 보다 긴 슬라이스는 None
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        if data.len() > CHUNK_SIZE {
            return None;
        }

        let mut buf = Vec::with_capacity(CHUNK_SIZE);
        buf.extend_from_slice(data);
        buf.resize(CHUNK_SIZE, 0);

        Some(Self {
            data: Bytes::from(buf),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 데이터를 청크들로 분할
///
/// 길이 L 에 대해 ceil(L / 196)개 청크. 255개를 넘으면 PayloadTooLarge.
pub fn split_into_chunks(data: &[u8]) -> Result<Vec<Chunk>> {
    let total_chunks = (data.len() + CHUNK_SIZE - 1) / CHUNK_SIZE;
    if total_chunks > MAX_CHUNKS {
        return Err(Error::PayloadTooLarge {
            chunks: total_chunks,
            max: MAX_CHUNKS,
        });
    }

    Ok(data
        .chunks(CHUNK_SIZE)
        .filter_map(Chunk::from_slice)
        .collect())
}

/// 전송 계획
#[derive(Debug, Clone)]
pub struct TransferPlan {
    chunks: Vec<Chunk>,
    format: PayloadFormat,
    payload_len: usize,
}

impl TransferPlan {
    /// 페이로드 검증 후 전송 계획 생성
    ///
    /// 시그니처 검사가 분할보다 먼저 실행되며, 전송 계층 활동 전에 모든 검증이 끝남
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let format = PayloadFormat::detect(payload)?;
        let chunks = split_into_chunks(payload)?;

        Ok(Self {
            chunks,
            format,
            payload_len: payload.len(),
        })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// 총 청크 수 N (1..=255)
    pub fn total(&self) -> u8 {
        self.chunks.len() as u8
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// 패딩 포함 전송 바이트 수
    pub fn padded_len(&self) -> usize {
        self.chunks.len() * CHUNK_SIZE
    }
}
