//! 애니메이션 파일 로딩과 시그니처 검사

use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::{Error, Result};

/// 인식 가능한 이미지 포맷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Gif87a,
    Gif89a,
}

impl PayloadFormat {
    /// 6바이트 매직 시그니처
    pub fn signature(&self) -> &'static [u8; 6] {
        match self {
            PayloadFormat::Gif87a => b"GIF87a",
            PayloadFormat::Gif89a => b"GIF89a",
        }
    }

    /// 페이로드 앞부분으로 포맷 판별
    pub fn detect(payload: &[u8]) -> Result<Self> {
        [PayloadFormat::Gif87a, PayloadFormat::Gif89a]
            .into_iter()
            .find(|format| payload.starts_with(format.signature()))
            .ok_or_else(|| Error::InvalidFormat {
                reason: if payload.is_empty() {
                    "빈 파일".to_string()
                } else {
                    "GIF87a/GIF89a 시그니처 없음".to_string()
                },
            })
    }
}

/// 파일을 읽고 시그니처 검사
pub fn read_payload(path: impl AsRef<Path>) -> Result<Bytes> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("GIF 파일을 열 수 없음 {}: {}", path.display(), e),
        ))
    })?;

    let format = PayloadFormat::detect(&data).map_err(|_| Error::InvalidFormat {
        reason: format!("{} 는 GIF 파일이 아님", path.display()),
    })?;

    debug!("Loaded {:?} ({} bytes, {:?})", path, data.len(), format);
    Ok(Bytes::from(data))
}
