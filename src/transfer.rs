//! 전송 오케스트레이터
//!
//! START → ALLOCATE → READ → WRITE → (READ/WRITE 반복) → END
//!
//! - 한 번에 하나의 읽기, 이어서 하나의 쓰기 (파이프라이닝 없음)
//! - 첫 번째 치명적 에러에서 중단, 재시도/재개 없음
//! - 버퍼는 모든 종료 경로에서 drop으로 해제

use std::io::Write;

use serde_json::json;
use tracing::{debug, event, info, Level};

use crate::buffer::{AllocStrategy, TransferBuffer};
use crate::config::TransferConfig;
use crate::reader::ChunkedReader;
use crate::session::RemoteFile;
use crate::sink::{Destination, SinkWriter};
use crate::stats::{StatsRecorder, TransferStats};
use crate::{Error, Result};

/// 청크별 "got N bytes" 로그 레벨
pub const CHUNK_LOG_LEVEL: Level = Level::INFO;

/// 전송 결과
#[derive(Debug)]
pub struct TransferReport {
    /// 확정된 통계 (실패 시 중단 시점까지)
    pub stats: TransferStats,

    /// 사용된 버퍼 할당 방식 (할당 전 실패 시 None)
    pub strategy: Option<AllocStrategy>,

    /// 실패 원인
    pub error: Option<Error>,
}

impl TransferReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// 출력으로 전달된 바이트 수
    pub fn bytes_transferred(&self) -> u64 {
        self.stats.total_bytes()
    }

    pub fn elapsed_us(&self) -> u64 {
        self.stats.elapsed_us()
    }

    /// 실패였다면 에러로 변환
    pub fn into_result(self) -> Result<TransferStats> {
        match self.error {
            None => Ok(self.stats),
            Some(e) => Err(e),
        }
    }

    /// 기계 판독용 요약
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "status": if self.is_success() { "success" } else { "failure" },
            "bytes_transferred": self.bytes_transferred(),
            "elapsed_us": self.elapsed_us(),
            "throughput_bytes_per_sec": self.stats.throughput(),
            "reads": self.stats.reads(),
            "empty_reads": self.stats.empty_reads(),
            "crc32": format!("{:08x}", self.stats.checksum()),
            "allocation": self.strategy,
            "error": self.error.as_ref().map(|e| e.to_string()),
        })
    }
}

/// 단일 파일 전송기
#[derive(Debug, Clone, Default)]
pub struct Transfer {
    config: TransferConfig,
}

impl Transfer {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// `file` 전체를 `sink`로 복사한다
    pub fn run<F, W>(&self, file: &mut F, sink: W) -> TransferReport
    where
        F: RemoteFile + ?Sized,
        W: Write,
    {
        let mut recorder = StatsRecorder::start();
        let mut strategy = None;
        let mut sink = SinkWriter::new(sink);

        let copied = self.copy(file, &mut sink, &mut recorder, &mut strategy);
        // 실패했더라도 이미 쓴 부분은 내보낸다
        let flushed = sink.finish().map(|_| ());

        let stats = recorder.finish();
        let error = copied.and(flushed).err();

        match &error {
            None => info!("Transfer complete: {}", stats.summary()),
            Some(e) => debug!("Transfer aborted after {} bytes: {}", stats.total_bytes(), e),
        }

        TransferReport {
            stats,
            strategy,
            error,
        }
    }

    fn copy<F, W>(
        &self,
        file: &mut F,
        sink: &mut SinkWriter<W>,
        recorder: &mut StatsRecorder,
        strategy: &mut Option<AllocStrategy>,
    ) -> Result<()>
    where
        F: RemoteFile + ?Sized,
        W: Write,
    {
        self.config.validate()?;

        let mut buffer =
            TransferBuffer::allocate(self.config.buffer_size, self.config.alloc_policy)?;
        *strategy = Some(buffer.strategy());
        debug!(
            "Transfer buffer: {} bytes ({:?})",
            buffer.capacity(),
            buffer.strategy()
        );

        let mut reader = ChunkedReader::new(file);
        loop {
            let chunk = reader.read_next(buffer.as_mut_slice())?;
            recorder.record_read(chunk.len);

            if self.config.log_chunks {
                event!(CHUNK_LOG_LEVEL, "got {} bytes", chunk.len);
            }

            if !chunk.is_empty() {
                let data = &buffer.as_slice()[..chunk.len];
                let before = sink.written();
                let written = sink.write_all(data);
                // 실패한 청크도 출력에 도달한 앞부분까지는 집계한다
                let accepted = (sink.written() - before) as usize;
                recorder.record_forwarded(&data[..accepted]);
                written?;
            }

            if !chunk.more {
                break;
            }
        }

        debug_assert_eq!(reader.offset(), sink.written());
        Ok(())
    }
}

/// 출력 대상을 열고 전송한다 (CLI 진입점에서 사용)
pub fn run_transfer<F>(
    file: &mut F,
    destination: &Destination,
    config: TransferConfig,
) -> TransferReport
where
    F: RemoteFile + ?Sized,
{
    match destination.open() {
        Ok(sink) => Transfer::new(config).run(file, sink),
        Err(e) => TransferReport {
            stats: StatsRecorder::start().finish(),
            strategy: None,
            error: Some(e),
        },
    }
}
