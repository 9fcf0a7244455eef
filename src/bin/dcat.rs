//! dcat - 마운트된 container의 파일을 stdout으로 출력
//!
//! ddump과 같은 전송 코어를 4KB 일반 버퍼로 사용하며, 청크마다 읽은 크기를
//! 기본 로그 레벨(info)에서 stderr에 남긴다.
//!
//! 사용법:
//!   dcat [OPTIONS] <PATH>

use std::process::ExitCode;

use clap::Parser;

use ddump::cli::{self, RunRequest, SessionArgs, TransferArgs};
use ddump::{Destination, TransferConfig};

#[derive(Debug, Parser)]
#[command(name = "dcat", version, about = "Print a file from a mounted object-store container")]
struct Cli {
    /// Path of the file inside the container
    path: String,

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
        destination: Destination::Stdout,
        transfer: cli.options.apply(TransferConfig::legacy_small()),
        path: cli.path,
        session: cli.session,
        options: cli.options,
    };

    cli::run(&request)
}
