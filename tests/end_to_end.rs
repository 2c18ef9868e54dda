//! 파일 로딩부터 finalize 까지 공개 API 로 전체 업로드 흐름 확인

use std::io::Write;

use ledgif::mock::{MockBehavior, MockConnector};
use ledgif::{read_payload, upload, Config, ControlFrame, ErrorKind, TransferPlan};

fn write_gif(len: usize) -> tempfile::NamedTempFile {
    let mut data = b"GIF89a1234".to_vec();
    data.extend((10..len).map(|i| (i * 7 % 256) as u8));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file
}

#[tokio::test(start_paused = true)]
async fn test_file_to_device() {
    let file = write_gif(1000);
    let payload = read_payload(file.path()).unwrap();
    let plan = TransferPlan::from_payload(&payload).unwrap();
    assert_eq!(plan.total(), 6);

    let connector = MockConnector::new(MockBehavior::default());
    let stats = upload(&connector, &Config::default(), &payload).await.unwrap();

    assert_eq!(stats.packets_acked, 6);
    assert_eq!(stats.payload_bytes, 1000);

    let recorder = connector.recorder();
    let frames = recorder.frames();
    // erase, prepare, 6 packets, finalize x2
    assert_eq!(frames.len(), 10);
    assert_eq!(&frames[0][..], ControlFrame::Erase.as_bytes());
    assert_eq!(&frames[1][..], ControlFrame::Prepare.as_bytes());
    assert!(frames[2..8].iter().all(|f| f.len() == 243));
    assert_eq!(&frames[8][..], ControlFrame::Finalize.as_bytes());
    assert_eq!(&frames[9][..], ControlFrame::Finalize.as_bytes());
    assert_eq!(recorder.disconnect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_device() {
    let file = write_gif(500);
    let payload = read_payload(file.path()).unwrap();

    let connector = MockConnector::new(MockBehavior::silent());
    let err = upload(&connector, &Config::default(), &payload)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AckTimeout);
    // erase, prepare, packet 0
    assert_eq!(connector.recorder().frames().len(), 3);
    assert_eq!(connector.recorder().disconnect_count(), 1);
}
