//! 청크 단위 순차 읽기
//!
//! 버퍼 용량만큼 요청하고, 요청보다 적게(또는 0바이트) 돌아오면 스트림 끝으로 본다.
//! 파일 크기가 용량의 배수이면 마지막에 0바이트 읽기가 한 번 더 발생하며 이는 정상이다.

use std::io;

use crate::session::RemoteFile;
use crate::{Error, Result};

/// 한 번의 읽기 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// 버퍼 앞쪽에 채워진 바이트 수
    pub len: usize,

    /// 다음 읽기를 계속해야 하는지
    pub more: bool,
}

impl Chunk {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// 원격 파일 순차 리더
pub struct ChunkedReader<'a, F: RemoteFile + ?Sized> {
    file: &'a mut F,
    offset: u64,
    finished: bool,
}

impl<'a, F: RemoteFile + ?Sized> ChunkedReader<'a, F> {
    pub fn new(file: &'a mut F) -> Self {
        Self {
            file,
            offset: 0,
            finished: false,
        }
    }

    /// 지금까지 읽은 바이트 수 (= 다음 읽기 오프셋)
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 다음 청크를 `buf`에 읽는다
    ///
    /// 스트림이 끝난 뒤 호출하면 원격 읽기 없이 빈 청크를 돌려준다.
    pub fn read_next(&mut self, buf: &mut [u8]) -> Result<Chunk> {
        if self.finished {
            return Ok(Chunk { len: 0, more: false });
        }

        let requested = buf.len();
        let outcome = match self.file.read_at(buf, self.offset) {
            Ok(outcome) if outcome.bytes_read <= requested => outcome,
            Ok(outcome) => {
                self.finished = true;
                return Err(Error::ReadFailed {
                    offset: self.offset,
                    source: io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "read returned {} bytes for a {} byte request",
                            outcome.bytes_read, requested
                        ),
                    ),
                });
            }
            Err(source) => {
                self.finished = true;
                return Err(Error::ReadFailed {
                    offset: self.offset,
                    source,
                });
            }
        };

        self.offset += outcome.bytes_read as u64;

        let more = outcome.segments > 0 && outcome.bytes_read == requested;
        if !more {
            self.finished = true;
        }

        Ok(Chunk {
            len: outcome.bytes_read,
            more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemorySession;
    use crate::session::Session;

    fn chunk_sizes(size: usize, capacity: usize) -> Vec<usize> {
        let session = MemorySession::new().with_file("/f", vec![7u8; size]);
        let (mut file, _) = session.open_file("/f").unwrap();
        let mut reader = ChunkedReader::new(file.as_mut());
        let mut buf = vec![0u8; capacity];

        let mut sizes = Vec::new();
        loop {
            let chunk = reader.read_next(&mut buf).unwrap();
            sizes.push(chunk.len);
            if !chunk.more {
                break;
            }
        }
        assert_eq!(reader.offset(), size as u64);
        sizes
    }

    #[test]
    fn test_short_read_ends_stream() {
        assert_eq!(chunk_sizes(10_000, 4096), vec![4096, 4096, 1808]);
    }

    #[test]
    fn test_exact_multiple_has_trailing_empty_read() {
        assert_eq!(chunk_sizes(8192, 4096), vec![4096, 4096, 0]);
    }

    #[test]
    fn test_small_and_empty_files() {
        assert_eq!(chunk_sizes(100, 4096), vec![100]);
        assert_eq!(chunk_sizes(0, 4096), vec![0]);
    }

    #[test]
    fn test_reader_is_fused() {
        let session = MemorySession::new().with_file("/f", vec![1u8; 10]);
        let (mut file, _) = session.open_file("/f").unwrap();
        let mut reader = ChunkedReader::new(file.as_mut());
        let mut buf = [0u8; 16];

        assert_eq!(reader.read_next(&mut buf).unwrap(), Chunk { len: 10, more: false });
        assert!(reader.is_finished());
        assert!(reader.read_next(&mut buf).unwrap().is_empty());
        assert_eq!(session.read_log().len(), 1);
    }

    #[test]
    fn test_read_error_reports_offset() {
        let session = MemorySession::new().with_file("/f", vec![1u8; 64]).fail_read(2);
        let (mut file, _) = session.open_file("/f").unwrap();
        let mut reader = ChunkedReader::new(file.as_mut());
        let mut buf = [0u8; 16];

        reader.read_next(&mut buf).unwrap();
        let err = reader.read_next(&mut buf).unwrap_err();
        assert!(matches!(err, Error::ReadFailed { offset: 16, .. }));
        assert!(reader.is_finished());
    }
}
