//! 세션 구현체

pub mod memory;
pub mod mount;

pub use memory::MemorySession;
pub use mount::MountedSession;
