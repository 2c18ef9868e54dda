//! 업로더 설정

use std::time::Duration;

use uuid::Uuid;

use crate::{Error, Result};

/// 기본 장치 주소 (다른 기기와 페어링되지 않은 상태여야 함)
pub const DEFAULT_DEVICE_ADDRESS: &str = "FF:24:06:18:41:5F";

/// 장치 상태 indication 특성 (Service Changed)
pub const INDICATION_UUID: Uuid = Uuid::from_u128(0x00002a05_0000_1000_8000_00805f9b34fb);

/// 데이터 알림 특성
pub const NOTIFICATION_UUID: Uuid = Uuid::from_u128(0x0000fff1_0000_1000_8000_00805f9b34fb);

/// 프레임 쓰기 특성 (핸들 0x000d)
pub const WRITE_UUID: Uuid = Uuid::from_u128(0x0000fff2_0000_1000_8000_00805f9b34fb);

/// 종료 프레임 최소 전송 횟수
pub const FINALIZE_REPEAT: usize = 2;

/// 업로더 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 장치 BLE 주소
    pub device_address: String,

    /// 패킷당 ACK 대기 타임아웃 (밀리초)
    pub ack_timeout_ms: u64,

    /// 리셋 프레임 사이 대기 시간 (밀리초)
    pub reset_settle_ms: u64,

    /// 종료 프레임 반복 횟수
    /// 한 번만 보내면 장치가 업로드 완료를 인식하지 못하므로
    /// `FINALIZE_REPEAT` 보다 작은 값은 무시됨
    pub finalize_repeat: usize,

    /// 응답 요구 쓰기 사용 여부
    pub write_with_response: bool,

    /// 장치 검색 타임아웃 (밀리초)
    pub scan_timeout_ms: u64,

    /// 진행 로그 출력 주기 (패킷 수)
    pub progress_log_interval: usize,

    /// 상태 indication 특성 UUID
    pub indication_uuid: Uuid,

    /// 데이터 알림 특성 UUID
    pub notification_uuid: Uuid,

    /// 프레임 쓰기 특성 UUID
    pub write_uuid: Uuid,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_address: DEFAULT_DEVICE_ADDRESS.to_string(),
            ack_timeout_ms: 750,
            reset_settle_ms: 500,
            finalize_repeat: FINALIZE_REPEAT,
            write_with_response: false,
            scan_timeout_ms: 10_000,
            progress_log_interval: 10,
            indication_uuid: INDICATION_UUID,
            notification_uuid: NOTIFICATION_UUID,
            write_uuid: WRITE_UUID,
        }
    }
}

impl Config {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 멀리 있거나 느린 장치용 설정
    pub fn patient() -> Self {
        Self {
            ack_timeout_ms: 2000,
            reset_settle_ms: 1000,
            scan_timeout_ms: 30_000,
            ..Self::default()
        }
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn reset_settle(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    /// 환경 변수로 기본 설정 덮어쓰기
    ///
    /// - `LEDGIF_ADDRESS`: 장치 주소
    /// - `LEDGIF_ACK_TIMEOUT_MS`: ACK 타임아웃
    /// - `LEDGIF_WRITE_UUID`: 쓰기 특성 UUID
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(address) = lookup("LEDGIF_ADDRESS") {
            self.device_address = address.trim().to_string();
        }

        if let Some(timeout) = lookup("LEDGIF_ACK_TIMEOUT_MS") {
            self.ack_timeout_ms = timeout
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("LEDGIF_ACK_TIMEOUT_MS 값이 숫자가 아님: {timeout}")))?;
        }

        if let Some(uuid) = lookup("LEDGIF_WRITE_UUID") {
            self.write_uuid = Uuid::parse_str(uuid.trim())
                .map_err(|e| Error::Config(format!("LEDGIF_WRITE_UUID 파싱 실패: {e}")))?;
        }

        Ok(self)
    }
}
