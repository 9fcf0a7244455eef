//! CLI 공통부
//!
//! `ddump`과 `dcat` 진입점은 인자 정의만 다르고 나머지는 여기서 공유한다.
//! 환경 변수는 이 경계에서만 읽어 `SessionConfig`로 변환한다.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use tracing::{error, info, warn};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::backend::MountedSession;
use crate::config::{AllocPolicy, SessionConfig, TransferConfig};
use crate::session::{lookup_regular_file, Session};
use crate::sink::Destination;
use crate::transfer::{run_transfer, TransferReport};
use crate::Result;

/// 스토리지 연결 인자
#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// Pool UUID
    #[arg(long, env = "DAOS_POOL")]
    pub pool: String,

    /// Container UUID
    #[arg(long = "cont", env = "DAOS_CONT")]
    pub container: String,

    /// Server group name
    #[arg(long, env = "DAOS_GROUP")]
    pub group: String,

    /// Service rank list, comma separated
    #[arg(long, env = "DAOS_SVCL")]
    pub svcl: String,

    /// Mount point of the container filesystem view
    #[arg(long, env = "DAOS_MOUNT", default_value = "/tmp/dfuse")]
    pub mount: PathBuf,
}

impl SessionArgs {
    pub fn to_config(&self) -> Result<SessionConfig> {
        SessionConfig::parse(&self.pool, &self.container, &self.group, &self.svcl, &self.mount)
    }
}

/// 전송/출력 인자
#[derive(Debug, Clone, Default, Args)]
pub struct TransferArgs {
    /// Transfer buffer size in bytes
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Skip the huge page attempt and use ordinary memory
    #[arg(long)]
    pub no_huge_pages: bool,

    /// Print the CRC32 of the copied bytes
    #[arg(long)]
    pub checksum: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Log filter (error, warn, info, debug, trace or a RUST_LOG directive)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl TransferArgs {
    /// 진입점 기본 설정에 인자를 덮어쓴다
    pub fn apply(&self, mut base: TransferConfig) -> TransferConfig {
        if let Some(size) = self.buffer_size {
            base.buffer_size = size;
        }
        if self.no_huge_pages {
            base.alloc_policy = AllocPolicy::AnonymousOnly;
        }
        base
    }
}

/// 한 번의 실행 요청
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub path: String,
    pub destination: Destination,
    pub session: SessionArgs,
    pub options: TransferArgs,
    pub transfer: TransferConfig,
}

/// 두 진입점의 기본 로그 필터 (dcat의 청크 로그 포함)
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// `--log-level` 값, RUST_LOG, 기본값 순으로 필터를 고른다
pub fn log_filter(
    level: Option<&str>,
    default_level: &str,
) -> std::result::Result<EnvFilter, ParseError> {
    match level {
        Some(level) => EnvFilter::try_new(level),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level))),
    }
}

/// 로깅 초기화 (stdout은 데이터 전용이므로 stderr로 출력)
pub fn init_logging(
    level: Option<&str>,
    default_level: &str,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let filter = log_filter(level, default_level)?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// 요청을 실행하고 종료 코드를 돌려준다
pub fn run(request: &RunRequest) -> ExitCode {
    match execute(request) {
        Ok(report) => {
            let success = report.is_success();
            if let Some(e) = &report.error {
                error!("data transfer failed: {}", error_chain(e));
            }
            eprintln!("{}", render_report(&report, &request.options));
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

fn execute(request: &RunRequest) -> Result<TransferReport> {
    let session_config = request.session.to_config()?;
    request.transfer.validate()?;

    let mut session = MountedSession::connect(&session_config)?;

    info!("opening: {}", request.path);
    let (mut file, _) = lookup_regular_file(&session, &request.path)?;

    let report = run_transfer(file.as_mut(), &request.destination, request.transfer.clone());

    if let Err(e) = session.close(file) {
        warn!("Failed to release {}: {}", request.path, e);
    }
    session.unmount()?;

    Ok(report)
}

/// 사용자 출력용 보고서 문자열
pub fn render_report(report: &TransferReport, options: &TransferArgs) -> String {
    if options.json {
        return report.to_json().to_string();
    }

    let mut line = report.stats.summary();
    if options.checksum {
        let _ = write!(line, ", crc32 {:08x}", report.stats.checksum());
    }
    if !report.is_success() {
        line.push_str(" (incomplete)");
    }
    line
}

fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
