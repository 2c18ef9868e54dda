//! 프레임 트레일러 체크섬
//!
//! 모든 프레임은 2바이트 트레일러로 끝남
//! - 1번째: 앞선 바이트들의 CheckSum8 Modulo 256
//! - 2번째: 앞선 바이트들(체크섬 제외) 합계의 상위 바이트

/// CheckSum8 Modulo 256
pub fn checksum_mod256(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// 트레일러 마지막 바이트
///
/// `bytes`는 체크섬 바이트까지 포함한 프레임 본문이며, 마지막 바이트(체크섬)는
/// 합계에서 제외된다. 합계는 16비트 안에 들어온다고 가정함 (최대 데이터 프레임
/// 241바이트 * 255 < 65536).
pub fn trailing_byte(bytes: &[u8]) -> u8 {
    let body = match bytes.split_last() {
        Some((_, body)) => body,
        None => return 0,
    };
    let total: u32 = body.iter().map(|&b| b as u32).sum();
    (total / 256) as u8
}

/// 본문에 2바이트 트레일러를 붙인다
pub fn append_trailer(frame: &mut Vec<u8>) {
    let sum = checksum_mod256(frame);
    frame.push(sum);
    let last = trailing_byte(frame);
    frame.push(last);
}
