//! 세션 / 전송 설정
//!
//! 코어 전송 로직은 환경 변수를 직접 읽지 않는다. 모든 값은 CLI 경계에서
//! 이 구조체들로 변환되어 명시적으로 전달된다.

use std::path::PathBuf;

use uuid::Uuid;

use crate::{Error, Result, HUGE_PAGE_SIZE};

/// 버퍼 할당 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocPolicy {
    /// huge page 매핑을 먼저 시도하고 실패하면 일반 익명 매핑
    PreferHugePages,
    /// 일반 익명 매핑만 사용
    AnonymousOnly,
}

/// 스토리지 세션 설정 (pool / container 식별 + 마운트 위치)
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// pool UUID
    pub pool: Uuid,

    /// container UUID
    pub container: Uuid,

    /// 서버 그룹 이름
    pub group: String,

    /// 서비스 rank 목록
    pub svc_ranks: Vec<u32>,

    /// container 파일시스템 뷰의 마운트 루트
    pub mount_root: PathBuf,

    /// 읽기 전용 접근 (ddump는 항상 true)
    pub read_only: bool,
}

impl SessionConfig {
    /// 문자열 값들로부터 세션 설정 생성
    pub fn parse(
        pool: &str,
        container: &str,
        group: &str,
        svc_ranks: &str,
        mount_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let pool = parse_uuid("pool", pool)?;
        let container = parse_uuid("container", container)?;

        let group = group.trim();
        if group.is_empty() {
            return Err(Error::Config("서버 그룹 이름이 비어 있음".into()));
        }

        Ok(Self {
            pool,
            container,
            group: group.to_string(),
            svc_ranks: parse_rank_list(svc_ranks)?,
            mount_root: mount_root.into(),
            read_only: true,
        })
    }
}

/// 전송 설정
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// 요청 버퍼 크기 (바이트)
    pub buffer_size: usize,

    /// 버퍼 할당 정책
    pub alloc_policy: AllocPolicy,

    /// 청크마다 읽은 크기를 로그로 남김
    pub log_chunks: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::huge_pages()
    }
}

impl TransferConfig {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 2MB huge page 버퍼 (기본)
    pub fn huge_pages() -> Self {
        Self {
            buffer_size: HUGE_PAGE_SIZE,
            alloc_policy: AllocPolicy::PreferHugePages,
            log_chunks: false,
        }
    }

    /// 4KB 일반 버퍼 + 청크 로그 (dcat 동작)
    pub fn legacy_small() -> Self {
        Self {
            buffer_size: 4096,
            alloc_policy: AllocPolicy::AnonymousOnly,
            log_chunks: true,
        }
    }

    /// 버퍼 크기 지정
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// 할당 정책 지정
    pub fn with_alloc_policy(mut self, alloc_policy: AllocPolicy) -> Self {
        self.alloc_policy = alloc_policy;
        self
    }

    /// 설정 검증
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::Config("버퍼 크기는 0보다 커야 함".into()));
        }
        Ok(())
    }
}

fn parse_uuid(what: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|e| Error::Config(format!("유효하지 않은 {} UUID '{}': {}", what, value, e)))
}

/// 서비스 rank 목록 파싱 ("0,1,2")
pub fn parse_rank_list(value: &str) -> Result<Vec<u32>> {
    let ranks = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| Error::Config(format!("유효하지 않은 rank '{}'", s)))
        })
        .collect::<Result<Vec<_>>>()?;

    if ranks.is_empty() {
        return Err(Error::Config("서비스 rank 목록이 비어 있음".into()));
    }
    Ok(ranks)
}
