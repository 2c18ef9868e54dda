//! btleplug 기반 BLE 전송 계층
//!
//! - 주소로 장치 검색 후 연결
//! - 알림 펌프 태스크가 특성 UUID 별로 등록된 핸들러에 알림 전달
//! - 모든 프레임은 하나의 쓰기 특성으로 전송

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, ValueNotification,
    WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::transport::{
    release_on_error, Connector, NotificationHandler, NotifySource, Transport,
};
use crate::{Config, Error, Result};

/// 검색 중 주변 장치 목록 확인 간격
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);

type HandlerMap = Arc<Mutex<HashMap<Uuid, NotificationHandler>>>;

fn connection_error(e: btleplug::Error) -> Error {
    Error::Connection(e.to_string())
}

/// BLE 연결 생성기
pub struct BleConnector {
    config: Config,
}

impl BleConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for BleConnector {
    type Transport = BleTransport;

    async fn connect(&self, address: &str) -> Result<BleTransport> {
        let target: BDAddr = address
            .parse()
            .map_err(|e| Error::Connection(format!("잘못된 장치 주소 {}: {}", address, e)))?;

        let manager = Manager::new().await.map_err(connection_error)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(connection_error)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Connection("BLE 어댑터 없음".to_string()))?;

        let peripheral = find_peripheral(&adapter, target, self.config.scan_timeout()).await?;

        peripheral.connect().await.map_err(connection_error)?;

        let setup = discover(&peripheral, self.config.write_uuid).await;
        let connected = &peripheral;
        let (characteristics, write_char, mut notifications) =
            release_on_error(setup, move || async move {
                connected.disconnect().await.map_err(connection_error)
            })
            .await?;

        let handlers: HandlerMap = Arc::default();
        let pump_handlers = handlers.clone();

        let pump = tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                let handler = pump_handlers.lock().get(&notification.uuid).cloned();
                match handler {
                    Some(handler) => handler(Bytes::from(notification.value)),
                    None => debug!("Unhandled notification from {}", notification.uuid),
                }
            }
            debug!("Notification stream closed");
        });

        info!(
            "BLE connected: {} ({} characteristics)",
            target,
            characteristics.len()
        );

        Ok(BleTransport {
            peripheral,
            characteristics,
            write_char,
            handlers,
            pump: Some(pump),
            indication_uuid: self.config.indication_uuid,
            notification_uuid: self.config.notification_uuid,
        })
    }
}

/// 연결된 장치의 서비스 검색, 쓰기 특성 확인, 알림 스트림 열기
async fn discover(
    peripheral: &Peripheral,
    write_uuid: Uuid,
) -> Result<(Vec<Characteristic>, Characteristic, BoxStream<'static, ValueNotification>)> {
    peripheral.discover_services().await.map_err(connection_error)?;

    let characteristics: Vec<Characteristic> = peripheral.characteristics().into_iter().collect();
    let write_char = characteristics
        .iter()
        .find(|c| c.uuid == write_uuid)
        .cloned()
        .ok_or_else(|| Error::Connection(format!("쓰기 특성 {} 없음", write_uuid)))?;

    let notifications = peripheral.notifications().await.map_err(connection_error)?;
    Ok((characteristics, write_char, notifications))
}

/// 주소가 일치하는 장치가 나타날 때까지 검색
async fn find_peripheral(
    adapter: &Adapter,
    target: BDAddr,
    scan_timeout: Duration,
) -> Result<Peripheral> {
    adapter
        .start_scan(ScanFilter::default())
        .await
        .map_err(connection_error)?;

    let deadline = Instant::now() + scan_timeout;
    let found = loop {
        let peripherals = adapter.peripherals().await.map_err(connection_error)?;
        if let Some(peripheral) = peripherals.into_iter().find(|p| p.address() == target) {
            break Some(peripheral);
        }
        if Instant::now() >= deadline {
            break None;
        }
        tokio::time::sleep(SCAN_POLL_INTERVAL).await;
    };

    if let Err(e) = adapter.stop_scan().await {
        debug!("stop_scan failed: {}", e);
    }

    found.ok_or_else(|| {
        Error::Connection(format!(
            "{} 장치를 찾을 수 없음 ({:.0}초 검색)",
            target,
            scan_timeout.as_secs_f64()
        ))
    })
}

/// BLE 연결
pub struct BleTransport {
    peripheral: Peripheral,
    characteristics: Vec<Characteristic>,
    write_char: Characteristic,
    handlers: HandlerMap,
    pump: Option<JoinHandle<()>>,
    indication_uuid: Uuid,
    notification_uuid: Uuid,
}

impl BleTransport {
    fn source_uuid(&self, source: NotifySource) -> Uuid {
        match source {
            NotifySource::Indications => self.indication_uuid,
            NotifySource::Notifications => self.notification_uuid,
        }
    }
}

#[async_trait]
impl Transport for BleTransport {
    async fn subscribe(&mut self, source: NotifySource, handler: NotificationHandler) -> Result<()> {
        let uuid = self.source_uuid(source);
        let characteristic = self
            .characteristics
            .iter()
            .find(|c| c.uuid == uuid)
            .cloned()
            .ok_or_else(|| Error::Subscription {
                source_name: source.name(),
                reason: format!("특성 {} 없음", uuid),
            })?;

        self.handlers.lock().insert(uuid, handler);
        self.peripheral
            .subscribe(&characteristic)
            .await
            .map_err(|e| Error::Subscription {
                source_name: source.name(),
                reason: e.to_string(),
            })
    }

    async fn write(&mut self, frame: &[u8], expect_response: bool) -> Result<()> {
        let write_type = if expect_response {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        self.peripheral
            .write(&self.write_char, frame, write_type)
            .await
            .map_err(|e| Error::TransportWrite(e.to_string()))
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.handlers.lock().clear();

        match self.peripheral.disconnect().await {
            Ok(()) => {
                info!("BLE disconnected: {}", self.peripheral.address());
                Ok(())
            }
            Err(e) => {
                warn!("BLE disconnect error: {}", e);
                Err(connection_error(e))
            }
        }
    }
}

impl Drop for BleTransport {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}
