//! 스토리지 세션 경계
//!
//! 전송 코어는 이 트레잇들을 통해서만 원격 파일에 접근한다.
//! 연결/마운트/해제는 세션 구현체의 책임이다.

use std::fmt;
use std::io;

use tracing::{info, warn};

use crate::{Error, Result};

/// 한 번의 위치 지정 읽기 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// 실제 읽은 바이트 수
    pub bytes_read: usize,

    /// 채워진 세그먼트 수 (0이면 데이터 없음)
    pub segments: u32,
}

impl ReadOutcome {
    /// 읽은 바이트 수로부터 결과 생성
    pub fn from_len(bytes_read: usize) -> Self {
        Self {
            bytes_read,
            segments: u32::from(bytes_read > 0),
        }
    }
}

/// 파일 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Other,
}

impl FileKind {
    pub fn from_file_type(ft: std::fs::FileType) -> Self {
        if ft.is_file() {
            FileKind::Regular
        } else if ft.is_dir() {
            FileKind::Directory
        } else if ft.is_symlink() {
            FileKind::Symlink
        } else {
            FileKind::Other
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Regular => "regular file",
            FileKind::Directory => "directory",
            FileKind::Symlink => "symlink",
            FileKind::Other => "special file",
        };
        f.write_str(name)
    }
}

/// 조회 시점의 파일 메타데이터 (stat)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub kind: FileKind,
    pub mode: u32,
}

/// 읽기 전용으로 열린 원격 파일 핸들
pub trait RemoteFile: Send {
    /// `offset`부터 최대 `buf.len()` 바이트를 읽는다
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<ReadOutcome>;

    /// 스토리지가 보고하는 현재 파일 크기
    fn size(&self) -> io::Result<u64>;
}

/// 마운트된 파일시스템 뷰
pub trait Session {
    /// 경로로 파일을 찾아 읽기 전용으로 연다
    fn open_file(&self, path: &str) -> Result<(Box<dyn RemoteFile>, FileMetadata)>;

    /// 파일 핸들 해제
    fn close(&self, file: Box<dyn RemoteFile>) -> Result<()>;

    /// 파일시스템 뷰 해제 및 연결 종료
    fn unmount(&mut self) -> Result<()>;
}

/// 경로를 열고 일반 파일이 아니면 거부한다
pub fn lookup_regular_file<S: Session + ?Sized>(
    session: &S,
    path: &str,
) -> Result<(Box<dyn RemoteFile>, FileMetadata)> {
    let (file, meta) = session.open_file(path)?;

    if meta.kind != FileKind::Regular {
        if let Err(e) = session.close(file) {
            warn!("Failed to release {}: {}", path, e);
        }
        return Err(Error::NotAFile {
            path: path.to_string(),
            kind: meta.kind.to_string(),
        });
    }

    info!("{} bytes in file (stat)", meta.size);
    match file.size() {
        Ok(size) if size != meta.size => {
            warn!("{}: stat size {} differs from store size {}", path, meta.size, size);
        }
        Ok(size) => info!("{} bytes in file (store)", size),
        Err(e) => warn!("{}: could not query store size: {}", path, e),
    }

    Ok((file, meta))
}
