//! 전송 통계
//!
//! 전송 중에는 `StatsRecorder`가 누적하고, 끝나면 `finish()`로
//! 변경 불가능한 `TransferStats`를 만든다.

use std::time::{Duration, Instant};

const MIB: f64 = 1024.0 * 1024.0;

/// 전송 중 통계 누적기
pub struct StatsRecorder {
    start_time: Instant,
    total_bytes: u64,
    reads: u64,
    empty_reads: u64,
    hasher: crc32fast::Hasher,
}

impl StatsRecorder {
    /// 시작 시각을 기록하며 생성
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
            total_bytes: 0,
            reads: 0,
            empty_reads: 0,
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// 원격 읽기 한 번 기록
    pub fn record_read(&mut self, len: usize) {
        self.reads += 1;
        if len == 0 {
            self.empty_reads += 1;
        }
    }

    /// 출력으로 전달된 청크 기록
    pub fn record_forwarded(&mut self, chunk: &[u8]) {
        self.total_bytes += chunk.len() as u64;
        self.hasher.update(chunk);
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// 종료 시각을 찍고 통계를 확정한다
    pub fn finish(self) -> TransferStats {
        let end_time = Instant::now();
        TransferStats {
            total_bytes: self.total_bytes,
            reads: self.reads,
            empty_reads: self.empty_reads,
            elapsed_us: end_time.duration_since(self.start_time).as_micros() as u64,
            checksum: self.hasher.finalize(),
            start_time: self.start_time,
            end_time,
        }
    }
}

/// 확정된 전송 통계
#[derive(Debug, Clone)]
pub struct TransferStats {
    total_bytes: u64,
    reads: u64,
    empty_reads: u64,
    elapsed_us: u64,
    checksum: u32,
    start_time: Instant,
    end_time: Instant,
}

impl TransferStats {
    /// 출력으로 전달된 총 바이트
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// 원격 읽기 호출 수 (빈 읽기 포함)
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// 0바이트로 끝난 읽기 수
    pub fn empty_reads(&self) -> u64 {
        self.empty_reads
    }

    /// 전달된 바이트 스트림의 CRC32
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn end_time(&self) -> Instant {
        self.end_time
    }

    /// 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.end_time.duration_since(self.start_time)
    }

    /// 경과 시간 (마이크로초)
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// 처리율 (bytes/sec)
    ///
    /// 경과 시간은 최소 1us로 취급하므로 바이트가 있으면 0이 되지 않는다.
    pub fn throughput(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let secs = self.elapsed().as_secs_f64().max(1e-6);
        self.total_bytes as f64 / secs
    }

    /// 처리율 (MiB/sec)
    pub fn throughput_mib(&self) -> f64 {
        self.throughput() / MIB
    }

    /// 통계 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "{} bytes, {:.0} ms, {:.1} MB/s",
            self.total_bytes,
            self.elapsed_us as f64 / 1000.0,
            self.throughput_mib(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total_bytes: u64, elapsed: Duration) -> TransferStats {
        let start_time = Instant::now();
        TransferStats {
            total_bytes,
            reads: 1,
            empty_reads: 0,
            elapsed_us: elapsed.as_micros() as u64,
            checksum: 0,
            start_time,
            end_time: start_time + elapsed,
        }
    }

    #[test]
    fn test_recorder_counts() {
        let mut recorder = StatsRecorder::start();
        recorder.record_read(3);
        recorder.record_forwarded(b"abc");
        recorder.record_read(0);
        assert_eq!(recorder.total_bytes(), 3);

        let stats = recorder.finish();
        assert_eq!(stats.total_bytes(), 3);
        assert_eq!(stats.reads(), 2);
        assert_eq!(stats.empty_reads(), 1);
        assert_eq!(stats.checksum(), crc32fast::hash(b"abc"));
        assert!(stats.end_time() >= stats.start_time());
    }

    #[test]
    fn test_throughput_zero_guard() {
        assert_eq!(stats(0, Duration::ZERO).throughput(), 0.0);
        assert_eq!(stats(0, Duration::from_secs(1)).throughput(), 0.0);
        assert!(stats(1, Duration::ZERO).throughput() > 0.0);
        assert_eq!(stats(1000, Duration::from_secs(2)).throughput(), 500.0);
    }

    #[test]
    fn test_summary_format() {
        let s = stats(10 * 1024 * 1024, Duration::from_millis(2000));
        assert_eq!(s.summary(), "10485760 bytes, 2000 ms, 5.0 MB/s");

        let s = stats(0, Duration::from_micros(400));
        assert_eq!(s.summary(), "0 bytes, 0 ms, 0.0 MB/s");
    }
}
