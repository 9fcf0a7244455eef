//! # ddump
//!
//! 오브젝트 스토리지 위에 마운트된 POSIX 파일시스템 뷰에서 파일 하나를
//! 고정 크기 버퍼로 스트리밍 복사하는 도구
//!
//! ## 핵심 특징
//! - **고정 메모리**: 2MB huge page 버퍼 하나로 전체 파일 전송 (실패 시 일반 메모리)
//! - **짧은 읽기 = EOF**: 요청보다 적게 돌아오면 스트림 종료
//! - **즉시 전달**: 읽은 청크를 바로 출력 (stdout 또는 파일)
//! - **계측**: 바이트 수, 경과 시간, 처리율, CRC32

pub mod backend;
pub mod buffer;
pub mod cli;
pub mod config;
pub mod error;
pub mod reader;
pub mod session;
pub mod sink;
pub mod stats;
pub mod transfer;

pub use buffer::{AllocStrategy, TransferBuffer};
pub use config::{AllocPolicy, SessionConfig, TransferConfig};
pub use error::{Error, Result};
pub use reader::{Chunk, ChunkedReader};
pub use session::{lookup_regular_file, FileKind, FileMetadata, ReadOutcome, RemoteFile, Session};
pub use sink::{Destination, SinkWriter};
pub use stats::{StatsRecorder, TransferStats};
pub use transfer::{run_transfer, Transfer, TransferReport};

/// huge page 크기 = 기본 전송 버퍼 크기 (바이트)
pub const HUGE_PAGE_SIZE: usize = 2 * 1024 * 1024; // 2MB
