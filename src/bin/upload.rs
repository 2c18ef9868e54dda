//! ledgif - BLE LED 매트릭스 GIF 업로더
//!
//! 사용법:
//!   ledgif <GIF_FILE>
//!
//! 환경 변수:
//!   LEDGIF_ADDRESS         장치 BLE 주소 (기본: FF:24:06:18:41:5F)
//!   LEDGIF_ACK_TIMEOUT_MS  패킷당 ACK 타임아웃 (기본: 750)
//!   LEDGIF_WRITE_UUID      쓰기 특성 UUID
//!   RUST_LOG               로그 레벨 (기본: info)

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ledgif::ble::BleConnector;
use ledgif::{read_payload, upload_plan, Config, TransferPlan, CHUNK_SIZE};

/// 명령행 인자
struct CliArgs {
    gif_path: PathBuf,
}

fn print_help() {
    println!(
        r#"ledgif - BLE 96x20 LED 매트릭스 GIF 업로더

사용법:
  ledgif <GIF_FILE>

인자:
  <GIF_FILE>   업로드할 GIF 애니메이션 (49,980 바이트 이하, 96x20 권장)

옵션:
  -h, --help   이 도움말 출력

환경 변수:
  LEDGIF_ADDRESS         장치 BLE 주소 (기본: FF:24:06:18:41:5F)
  LEDGIF_ACK_TIMEOUT_MS  패킷당 ACK 타임아웃 밀리초 (기본: 750)
  LEDGIF_WRITE_UUID      쓰기 특성 UUID
  RUST_LOG               로그 레벨 (기본: info)

장치는 다른 기기와 페어링되지 않은 상태여야 합니다.
"#
    );
}

fn parse_args() -> Result<CliArgs, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut gif_path = None;

    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => {
                return Err(format!("알 수 없는 옵션: {}", flag));
            }
            _ => {
                if gif_path.is_some() {
                    return Err("GIF 파일은 하나만 지정할 수 있습니다".to_string());
                }
                gif_path = Some(PathBuf::from(&arg));
            }
        }
    }

    gif_path
        .map(|gif_path| CliArgs { gif_path })
        .ok_or_else(|| "사용법: ledgif <GIF_FILE>".to_string())
}

async fn run(args: CliArgs) -> ledgif::Result<()> {
    let config = Config::from_env()?;

    let payload = read_payload(&args.gif_path)?;
    let plan = TransferPlan::from_payload(&payload)?;

    info!("Device address: {}", config.device_address);
    info!(
        "Uploading {:?} (~{} bytes, {} packets)",
        args.gif_path,
        plan.total() as usize * CHUNK_SIZE,
        plan.total()
    );

    let connector = BleConnector::new(config.clone());
    let stats = upload_plan(&connector, &config, &plan).await?;

    info!("{}", stats.summary());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // 로깅 설정
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("로거 초기화 실패: {}", e);
    }

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => {
            println!("\nUpload successful!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("업로드 에러: {}", e);
            ExitCode::FAILURE
        }
    }
}
