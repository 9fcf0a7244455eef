//! 출력 대상 쓰기
//!
//! 청크를 변환 없이 그대로 출력한다. 부분 쓰기는 모두 소진될 때까지 반복한다.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use crate::{Error, Result};

/// 새로 만드는 출력 파일 권한 (umask 적용 전)
pub const DESTINATION_MODE: u32 = 0o666;

/// 출력 대상
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// 표준 출력
    Stdout,
    /// 생성/절단해서 쓸 파일 경로
    Path(PathBuf),
}

impl Destination {
    /// 인자가 없거나 "-"이면 표준 출력
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None | Some("-") => Destination::Stdout,
            Some(path) => Destination::Path(PathBuf::from(path)),
        }
    }

    /// 쓰기 가능한 스트림으로 연다
    pub fn open(&self) -> Result<Box<dyn Write>> {
        match self {
            Destination::Stdout => Ok(Box::new(io::stdout().lock())),
            Destination::Path(path) => {
                let file: File = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(DESTINATION_MODE)
                    .open(path)
                    .map_err(|source| Error::Destination {
                        path: path.display().to_string(),
                        source,
                    })?;
                Ok(Box::new(file))
            }
        }
    }
}

/// 청크 전달기
pub struct SinkWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> SinkWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// 지금까지 출력한 바이트 수
    pub fn written(&self) -> u64 {
        self.written
    }

    /// `chunk` 전체를 출력한다
    ///
    /// 실패해도 그 전에 받아들여진 바이트는 `written()`에 반영된다.
    pub fn write_all(&mut self, chunk: &[u8]) -> Result<()> {
        let mut done = 0;
        while done < chunk.len() {
            match self.inner.write(&chunk[done..]) {
                Ok(0) => {
                    return Err(Error::WriteFailed {
                        offset: self.written,
                        source: io::Error::from(io::ErrorKind::WriteZero),
                    });
                }
                Ok(n) => {
                    done += n;
                    self.written += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(Error::WriteFailed {
                        offset: self.written,
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    /// flush 후 출력 바이트 수 반환
    pub fn finish(mut self) -> Result<u64> {
        self.inner.flush().map_err(|source| Error::WriteFailed {
            offset: self.written,
            source,
        })?;
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 한 번에 최대 3바이트만 받아들이는 writer
    struct Dribble(Vec<u8>);

    impl Write for Dribble {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(3);
            self.0.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_partial_writes_are_completed() {
        let mut sink = SinkWriter::new(Dribble(Vec::new()));
        sink.write_all(b"hello world").unwrap();
        sink.write_all(b"!").unwrap();
        assert_eq!(sink.written(), 12);
        assert_eq!(sink.inner.0, b"hello world!");
    }

    /// 첫 호출에서 절반만 받아들이고 이후 실패하는 writer
    struct HalfThenFail {
        accepted: Vec<u8>,
    }

    impl Write for HalfThenFail {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.accepted.is_empty() {
                return Err(io::Error::other("no space left"));
            }
            let n = buf.len() / 2;
            self.accepted.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_counts_accepted_prefix() {
        let mut sink = SinkWriter::new(HalfThenFail { accepted: Vec::new() });
        let err = sink.write_all(&[5u8; 1000]).unwrap_err();

        assert!(matches!(err, Error::WriteFailed { offset: 500, .. }));
        assert_eq!(sink.written(), 500);
        assert_eq!(sink.inner.accepted.len(), 500);
    }

    #[test]
    fn test_stalled_writer_fails() {
        let mut backing = [0u8; 4];
        let mut sink = SinkWriter::new(&mut backing[..]);
        sink.write_all(b"abcd").unwrap();
        let err = sink.write_all(b"e").unwrap_err();
        assert!(matches!(err, Error::WriteFailed { offset: 4, .. }));
    }

    #[test]
    fn test_destination_truncates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, vec![0xFFu8; 64]).unwrap();

        let dest = Destination::from_arg(path.to_str());
        let mut sink = SinkWriter::new(dest.open().unwrap());
        sink.write_all(b"abc").unwrap();
        assert_eq!(sink.finish().unwrap(), 3);

        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn test_destination_from_arg() {
        assert_eq!(Destination::from_arg(None), Destination::Stdout);
        assert_eq!(Destination::from_arg(Some("-")), Destination::Stdout);
        assert_eq!(
            Destination::from_arg(Some("/tmp/x")),
            Destination::Path(PathBuf::from("/tmp/x"))
        );
    }
}
