//! 메모리 기반 세션
//!
//! 테스트와 벤치마크에서 실제 스토리지 없이 전송 코어를 구동하기 위한 구현.
//! N번째 읽기 실패 주입과 읽기 호출 기록을 지원한다.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::warn;

use crate::session::{FileKind, FileMetadata, ReadOutcome, RemoteFile, Session};
use crate::{Error, Result};

/// 읽기 호출 기록
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCall {
    pub offset: u64,
    pub requested: usize,
    pub returned: usize,
}

#[derive(Debug, Clone)]
enum Entry {
    File(Bytes),
    Directory,
}

#[derive(Debug, Default)]
struct Shared {
    calls: Vec<ReadCall>,
    /// 1부터 세는 실패시킬 읽기 호출 번호
    fail_on: Option<usize>,
    attempts: usize,
    open_handles: usize,
}

/// 메모리 세션
#[derive(Debug)]
pub struct MemorySession {
    entries: HashMap<String, Entry>,
    shared: Arc<Mutex<Shared>>,
    mounted: bool,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            shared: Arc::new(Mutex::new(Shared::default())),
            mounted: true,
        }
    }

    /// 파일 추가
    pub fn with_file(mut self, path: &str, data: impl Into<Bytes>) -> Self {
        self.entries.insert(normalize(path), Entry::File(data.into()));
        self
    }

    /// 디렉터리 추가
    pub fn with_directory(mut self, path: &str) -> Self {
        self.entries.insert(normalize(path), Entry::Directory);
        self
    }

    /// `nth`번째 읽기 호출을 실패시킨다
    pub fn fail_read(self, nth: usize) -> Self {
        self.shared.lock().fail_on = Some(nth);
        self
    }

    /// 지금까지 성공한 읽기 호출 목록
    pub fn read_log(&self) -> Vec<ReadCall> {
        self.shared.lock().calls.clone()
    }

    /// 열려 있는 핸들 수
    pub fn open_handles(&self) -> usize {
        self.shared.lock().open_handles
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl Session for MemorySession {
    fn open_file(&self, path: &str) -> Result<(Box<dyn RemoteFile>, FileMetadata)> {
        if !self.mounted {
            return Err(Error::Session("파일시스템이 마운트되지 않음".into()));
        }

        let entry = self.entries.get(&normalize(path)).ok_or_else(|| Error::LookupFailed {
            path: path.to_string(),
            reason: "no such file or directory".into(),
        })?;

        let (data, kind, mode) = match entry {
            Entry::File(data) => (data.clone(), FileKind::Regular, 0o100644),
            Entry::Directory => (Bytes::new(), FileKind::Directory, 0o040755),
        };

        self.shared.lock().open_handles += 1;

        let meta = FileMetadata {
            size: data.len() as u64,
            kind,
            mode,
        };
        let file = MemoryFile {
            data,
            shared: self.shared.clone(),
        };
        Ok((Box::new(file), meta))
    }

    fn close(&self, file: Box<dyn RemoteFile>) -> Result<()> {
        drop(file);
        let mut shared = self.shared.lock();
        shared.open_handles = shared.open_handles.saturating_sub(1);
        Ok(())
    }

    fn unmount(&mut self) -> Result<()> {
        let open = self.open_handles();
        if open > 0 {
            warn!("Unmounting with {} open handle(s)", open);
        }
        self.mounted = false;
        Ok(())
    }
}

/// 메모리 파일 핸들
struct MemoryFile {
    data: Bytes,
    shared: Arc<Mutex<Shared>>,
}

impl RemoteFile for MemoryFile {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<ReadOutcome> {
        let mut shared = self.shared.lock();
        shared.attempts += 1;
        if shared.fail_on == Some(shared.attempts) {
            return Err(io::Error::other("injected read failure"));
        }

        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.data.len());
        let len = buf.len().min(self.data.len() - start);
        buf[..len].copy_from_slice(&self.data[start..start + len]);

        shared.calls.push(ReadCall {
            offset,
            requested: buf.len(),
            returned: len,
        });
        Ok(ReadOutcome::from_len(len))
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::lookup_regular_file;

    #[test]
    fn test_read_past_end_is_empty() {
        let session = MemorySession::new().with_file("/a", vec![1u8, 2, 3]);
        let (mut file, meta) = session.open_file("a").unwrap();
        assert_eq!(meta.size, 3);

        let mut buf = [0u8; 8];
        assert_eq!(file.read_at(&mut buf, 0).unwrap(), ReadOutcome { bytes_read: 3, segments: 1 });
        assert_eq!(file.read_at(&mut buf, 3).unwrap(), ReadOutcome { bytes_read: 0, segments: 0 });
        assert_eq!(file.read_at(&mut buf, 100).unwrap().bytes_read, 0);
    }

    #[test]
    fn test_lookup_rejects_directory_and_missing() {
        let session = MemorySession::new().with_directory("/dir");

        let err = lookup_regular_file(&session, "/dir").err().unwrap();
        assert!(matches!(err, Error::NotAFile { .. }));
        assert_eq!(session.open_handles(), 0);

        let err = lookup_regular_file(&session, "/missing").err().unwrap();
        assert!(matches!(err, Error::LookupFailed { .. }));
    }

    #[test]
    fn test_injected_failure() {
        let session = MemorySession::new().with_file("/f", vec![0u8; 16]).fail_read(2);
        let (mut file, _) = session.open_file("/f").unwrap();

        let mut buf = [0u8; 8];
        assert!(file.read_at(&mut buf, 0).is_ok());
        assert!(file.read_at(&mut buf, 8).is_err());
        assert_eq!(session.read_log().len(), 1);
    }

    #[test]
    fn test_unmount_blocks_lookup() {
        let mut session = MemorySession::new().with_file("/f", vec![1u8]);
        let (file, _) = session.open_file("/f").unwrap();
        session.close(file).unwrap();
        session.unmount().unwrap();

        assert!(!session.is_mounted());
        assert!(matches!(session.open_file("/f").err().unwrap(), Error::Session(_)));
    }
}
