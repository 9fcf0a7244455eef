//! 전송 버퍼 할당
//!
//! - 1차: 2MB huge page 매핑 (MAP_HUGETLB | MAP_HUGE_2MB)
//! - 2차: 같은 크기의 일반 익명 매핑
//! - 둘 다 실패하면 AllocationFailed (크기를 줄여 재시도하지 않음)
//!
//! 매핑은 `Drop`에서 정확히 한 번 해제된다.

use std::io;
use std::ptr::{self, NonNull};
use std::slice;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::AllocPolicy;
use crate::{Error, Result, HUGE_PAGE_SIZE};

// mmap(2) huge page 크기 선택자
#[cfg(target_os = "linux")]
const MAP_HUGE_SHIFT: libc::c_int = 26;
#[cfg(target_os = "linux")]
const MAP_HUGE_2MB: libc::c_int = 21 << MAP_HUGE_SHIFT;

/// 실제로 사용된 할당 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocStrategy {
    /// huge page 기반 매핑
    HugePage,
    /// 일반 익명 매핑
    Anonymous,
}

/// 전송 버퍼 (독점 소유, 고정 용량)
pub struct TransferBuffer {
    ptr: NonNull<u8>,
    len: usize,
    strategy: AllocStrategy,
}

// SAFETY: 매핑은 이 구조체가 단독으로 소유하며 공유되지 않는다.
unsafe impl Send for TransferBuffer {}

impl TransferBuffer {
    /// 정책에 따라 `size` 바이트 버퍼 할당
    pub fn allocate(size: usize, policy: AllocPolicy) -> Result<Self> {
        if size == 0 {
            return Err(Error::AllocationFailed {
                size,
                source: io::Error::new(io::ErrorKind::InvalidInput, "zero-sized buffer"),
            });
        }

        if policy == AllocPolicy::PreferHugePages {
            match map_huge(size) {
                Ok(ptr) => {
                    debug!("Allocated {} byte transfer buffer from huge pages", size);
                    return Ok(Self {
                        ptr,
                        len: size,
                        strategy: AllocStrategy::HugePage,
                    });
                }
                Err(e) => {
                    debug!("Huge page mapping unavailable ({}), falling back", e);
                }
            }
        }

        let ptr =
            map_anonymous(size, 0).map_err(|source| Error::AllocationFailed { size, source })?;
        debug!("Allocated {} byte transfer buffer from anonymous memory", size);

        Ok(Self {
            ptr,
            len: size,
            strategy: AllocStrategy::Anonymous,
        })
    }

    /// 실제 확보된 용량
    pub fn capacity(&self) -> usize {
        self.len
    }

    pub fn strategy(&self) -> AllocStrategy {
        self.strategy
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr..ptr+len 은 살아있는 읽기/쓰기 매핑이다.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: &mut self 로 독점 접근이 보장된다.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for TransferBuffer {
    fn drop(&mut self) {
        // SAFETY: allocate()에서 같은 길이로 매핑한 영역이며 여기서 한 번만 해제된다.
        let ret = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) };
        if ret != 0 {
            warn!("munmap failed: {}", io::Error::last_os_error());
        }
    }
}

impl std::fmt::Debug for TransferBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferBuffer")
            .field("capacity", &self.len)
            .field("strategy", &self.strategy)
            .finish()
    }
}

fn map_anonymous(size: usize, extra_flags: libc::c_int) -> io::Result<NonNull<u8>> {
    // SAFETY: fd 없는 익명 매핑, 주소는 커널이 선택한다.
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | extra_flags,
            -1,
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    NonNull::new(addr.cast::<u8>()).ok_or_else(|| io::Error::other("mmap returned null"))
}

#[cfg(target_os = "linux")]
fn map_huge(size: usize) -> io::Result<NonNull<u8>> {
    // huge page 매핑은 페이지 크기의 배수여야 munmap 길이가 맞는다
    if size % HUGE_PAGE_SIZE != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a multiple of the huge page size", size),
        ));
    }
    map_anonymous(size, libc::MAP_HUGETLB | MAP_HUGE_2MB)
}

#[cfg(not(target_os = "linux"))]
fn map_huge(_size: usize) -> io::Result<NonNull<u8>> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "huge pages are linux only"))
}
