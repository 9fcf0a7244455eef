//! 에러 타입 정의

use thiserror::Error;

/// ddump 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    #[error("전송 버퍼 할당 실패: size={size}: {source}")]
    AllocationFailed {
        size: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("경로 조회 실패 '{path}': {reason}")]
    LookupFailed { path: String, reason: String },

    #[error("일반 파일이 아님 '{path}' ({kind})")]
    NotAFile { path: String, kind: String },

    #[error("원격 읽기 실패: offset={offset}: {source}")]
    ReadFailed {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("출력 쓰기 실패: offset={offset}: {source}")]
    WriteFailed {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("출력 대상을 열 수 없음 '{path}': {source}")]
    Destination {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("설정 에러: {0}")]
    Config(String),

    #[error("세션 에러: {0}")]
    Session(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
