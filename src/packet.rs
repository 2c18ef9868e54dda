//! 와이어 프레임 정의
//!
//! 장치 펌웨어 포맷은 관찰로만 알아낸 것이라 의미를 모르는 구간이 많음.
//! 그런 구간은 계산하지 않고 이름 붙은 상수로 둔다.
//!
//! 데이터 패킷 레이아웃 (243 바이트):
//!
//! ```text
//! AA 55 FF FF | len | idx(3) | HEADER_TEMPLATE(27) | N | idx(3) | C4 00 00 13 | 81 C4 | chunk(196) | sum | hi
//! ```

use bytes::Bytes;

use crate::checksum::append_trailer;
use crate::chunk::Chunk;
use crate::{Error, Result, FRAME_MARKER, MAX_CHUNKS};

/// 길이 바이트 보정값 (앞 40바이트 + 트레일러 1바이트)
pub const LENGTH_OFFSET: usize = 41;

/// 첫 번째 인덱스 필드 뒤 고정 구간 (의미 불명)
pub const HEADER_TEMPLATE: [u8; 27] = [
    0xC1, 0x02, 0x09, 0x01, 0x01, 0x0C, 0x01, 0x00, 0x0D, 0x01, 0x00, 0x0E, 0x01, 0x00, 0x14, 0x03,
    0x01, 0x09, 0x0A, 0x11, 0x04, 0x00, 0x01, 0x00, 0x0A, 0x12, 0x07,
];

/// 두 번째 인덱스 필드 뒤 고정 구간
pub const HEADER_TAIL: [u8; 4] = [0xC4, 0x00, 0x00, 0x13];

/// 페이로드 길이에 따라 달라지는 구간. 196바이트 전체 청크에서만 검증됨
pub const FULL_CHUNK_MARKER: [u8; 2] = [0x81, 0xC4];

/// 헤더 길이 (마커부터 FULL_CHUNK_MARKER 까지)
pub const HEADER_LEN: usize = FRAME_MARKER.len()
    + 1
    + 3
    + HEADER_TEMPLATE.len()
    + 1
    + 3
    + HEADER_TAIL.len()
    + FULL_CHUNK_MARKER.len();

/// 트레일러 길이
pub const TRAILER_LEN: usize = 2;

/// 고정 제어 프레임
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFrame {
    /// 저장된 애니메이션 삭제
    Erase,

    /// 새 애니메이션 수신 준비
    Prepare,

    /// 업로드 완료 알림
    Finalize,
}

const ERASE_FRAME: [u8; 16] = [
    0xAA, 0x55, 0xFF, 0xFF, 0x0A, 0x00, 0x09, 0x00, 0xC1, 0x02, 0x08, 0x02, 0x00, 0xFF, 0xDC, 0x04,
];

const PREPARE_FRAME: [u8; 16] = [
    0xAA, 0x55, 0xFF, 0xFF, 0x0A, 0x00, 0x09, 0x00, 0xC1, 0x02, 0x08, 0x02, 0x00, 0x00, 0xDD, 0x03,
];

const FINALIZE_FRAME: [u8; 17] = [
    0xAA, 0x55, 0xFF, 0xFF, 0x0B, 0x00, 0x0F, 0x00, 0xC1, 0x02, 0x36, 0x03, 0x01, 0x00, 0x00, 0x14,
    0x04,
];

impl ControlFrame {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            ControlFrame::Erase => &ERASE_FRAME,
            ControlFrame::Prepare => &PREPARE_FRAME,
            ControlFrame::Finalize => &FINALIZE_FRAME,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlFrame::Erase => "erase",
            ControlFrame::Prepare => "prepare",
            ControlFrame::Finalize => "finalize",
        }
    }
}

/// 데이터 패킷
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    index: u8,
    bytes: Bytes,
}

impl Packet {
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 헤더의 길이 바이트 값
    /// 첫 인덱스 필드부터 체크섬 바이트까지의 길이 (= 전체 - 6)
    pub fn declared_len(&self) -> u8 {
        self.bytes[FRAME_MARKER.len()]
    }

    /// 트레일러 2바이트
    pub fn trailer(&self) -> [u8; 2] {
        let n = self.bytes.len();
        [self.bytes[n - 2], self.bytes[n - 1]]
    }
}

/// 인덱스 필드: 2바이트 빅엔디언 + 0 패딩
fn index_field(index: u8) -> [u8; 3] {
    let [hi, lo] = (index as u16).to_be_bytes();
    [hi, lo, 0x00]
}

/// 청크 하나로 데이터 패킷 생성
///
/// `index >= total` 이거나 `total > 255` 이면 IndexOutOfRange
pub fn encode_packet(chunk: &Chunk, index: usize, total: usize) -> Result<Packet> {
    if index >= total || total > MAX_CHUNKS {
        return Err(Error::IndexOutOfRange { index, total });
    }

    let index = index as u8;
    let mut frame = Vec::with_capacity(HEADER_LEN + chunk.len() + TRAILER_LEN);

    frame.extend_from_slice(&FRAME_MARKER);
    frame.push((chunk.len() + LENGTH_OFFSET) as u8);
    frame.extend_from_slice(&index_field(index));
    frame.extend_from_slice(&HEADER_TEMPLATE);
    frame.push(total as u8);
    frame.extend_from_slice(&index_field(index));
    frame.extend_from_slice(&HEADER_TAIL);
    frame.extend_from_slice(&FULL_CHUNK_MARKER);
    frame.extend_from_slice(chunk.as_bytes());
    append_trailer(&mut frame);

    Ok(Packet {
        index,
        bytes: Bytes::from(frame),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{checksum_mod256, trailing_byte};
    use crate::CHUNK_SIZE;

    fn zero_chunk() -> Chunk {
        Chunk::from_slice(&[]).unwrap()
    }

    #[test]
    fn test_header_len() {
        assert_eq!(HEADER_LEN, 45);
    }

    #[test]
    fn test_packet_layout() {
        let chunk = Chunk::from_slice(&[0x42; CHUNK_SIZE]).unwrap();
        let packet = encode_packet(&chunk, 7, 12).unwrap();
        let bytes = packet.as_bytes();

        assert_eq!(packet.len(), 243);
        assert_eq!(&bytes[..4], &FRAME_MARKER);
        assert_eq!(packet.declared_len(), 237);
        assert_eq!(packet.declared_len() as usize, packet.len() - 6);
        assert_eq!(&bytes[5..8], &[0x00, 0x07, 0x00]);
        assert_eq!(&bytes[8..35], &HEADER_TEMPLATE);
        assert_eq!(bytes[35], 12);
        assert_eq!(&bytes[36..39], &[0x00, 0x07, 0x00]);
        assert_eq!(&bytes[39..43], &HEADER_TAIL);
        assert_eq!(&bytes[43..45], &FULL_CHUNK_MARKER);
        assert_eq!(&bytes[45..241], chunk.as_bytes());
        assert_eq!(packet.index(), 7);
    }

    #[test]
    fn test_trailer_hand_computed_zero_chunk() {
        // 마커 765 + 길이 237 + 템플릿 348 + N 1 + 꼬리 215 + 81C4 325 = 1891 = 0x0763
        let packet = encode_packet(&zero_chunk(), 0, 1).unwrap();
        assert_eq!(packet.trailer(), [0x63, 0x07]);
    }

    #[test]
    fn test_trailer_hand_computed_full_chunk() {
        // 헤더 1891 + 0xFF * 196 (49980) = 51871 = 0xCA9F
        let chunk = Chunk::from_slice(&[0xFF; CHUNK_SIZE]).unwrap();
        let packet = encode_packet(&chunk, 0, 1).unwrap();
        assert_eq!(packet.trailer(), [0x9F, 0xCA]);
    }

    #[test]
    fn test_trailer_matches_checksum_engine() {
        let chunk = Chunk::from_slice(b"GIF89a some frame data").unwrap();
        let packet = encode_packet(&chunk, 3, 4).unwrap();
        let bytes = packet.as_bytes();
        let n = bytes.len();

        assert_eq!(bytes[n - 2], checksum_mod256(&bytes[..n - 2]));
        assert_eq!(bytes[n - 1], trailing_byte(&bytes[..n - 1]));
    }

    #[test]
    fn test_deterministic() {
        let chunk = Chunk::from_slice(b"repeatable").unwrap();
        let a = encode_packet(&chunk, 5, 9).unwrap();
        let b = encode_packet(&chunk, 5, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_index_out_of_range() {
        for total in [1usize, 255] {
            match encode_packet(&zero_chunk(), total, total) {
                Err(Error::IndexOutOfRange { index, total: t }) => {
                    assert_eq!(index, total);
                    assert_eq!(t, total);
                }
                other => panic!("unexpected: {:?}", other),
            }
        }

        assert!(encode_packet(&zero_chunk(), 0, 256).is_err());
        assert!(encode_packet(&zero_chunk(), 0, 0).is_err());
        assert!(encode_packet(&zero_chunk(), 254, 255).is_ok());
    }

    #[test]
    fn test_control_frames_follow_trailer_rules() {
        for frame in [ControlFrame::Erase, ControlFrame::Prepare, ControlFrame::Finalize] {
            let bytes = frame.as_bytes();
            let mut rebuilt = bytes[..bytes.len() - 2].to_vec();
            append_trailer(&mut rebuilt);

            assert_eq!(rebuilt.as_slice(), bytes, "{}", frame.name());
            assert_eq!(bytes[4] as usize, bytes.len() - 6, "{}", frame.name());
        }
    }
}
