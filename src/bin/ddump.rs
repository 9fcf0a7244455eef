//! ddump - 마운트된 container에서 파일 하나를 stdout 또는 로컬 파일로 복사
//!
//! 2MB huge page 버퍼(불가 시 일반 메모리)로 전체 파일을 스트리밍하고
//! 바이트 수, 경과 시간, 처리율을 stderr에 출력한다.
//!
//! 사용법:
//!   ddump [OPTIONS] <PATH> [DESTINATION]
//!
//! 예시:
//!   # stdout으로
//!   DAOS_POOL=... DAOS_CONT=... DAOS_GROUP=daos_server DAOS_SVCL=0 ddump /data/file.bin > file.bin
//!
//!   # 파일로 + CRC32
//!   ddump --checksum /data/file.bin /scratch/file.bin

use std::process::ExitCode;

use clap::Parser;

use ddump::cli::{self, RunRequest, SessionArgs, TransferArgs};
use ddump::{Destination, TransferConfig};

#[derive(Debug, Parser)]
#[command(name = "ddump", version, about = "Stream a file out of a mounted object-store container")]
struct Cli {
    /// Path of the file inside the container
    path: String,

    /// Destination file (stdout when omitted or "-")
    destination: Option<String>,

    #[command(flatten)]
    session: SessionArgs,

    #[command(flatten)]
    options: TransferArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = cli::init_logging(cli.options.log_level.as_deref(), cli::DEFAULT_LOG_LEVEL) {
        eprintln!("logging setup failed: {}", e);
        return ExitCode::FAILURE;
    }

    let request = RunRequest {
        destination: Destination::from_arg(cli.destination.as_deref()),
        transfer: cli.options.apply(TransferConfig::huge_pages()),
        path: cli.path,
        session: cli.session,
        options: cli.options,
    };

    cli::run(&request)
}
