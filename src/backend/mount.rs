//! 마운트 포인트 기반 세션
//!
//! container의 POSIX 파일시스템 뷰가 로컬 마운트 포인트(dfuse 등)로 노출된 경우를
//! 다룬다. 경로는 container 루트 기준으로 해석하며 `..` 구성요소는 거부한다.

use std::fs::File;
use std::io;
use std::os::unix::fs::{FileExt, MetadataExt};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::session::{FileKind, FileMetadata, ReadOutcome, RemoteFile, Session};
use crate::{Error, Result};

/// 마운트된 container 세션
#[derive(Debug)]
pub struct MountedSession {
    config: SessionConfig,
    root: PathBuf,
    mounted: bool,
}

impl MountedSession {
    /// pool/container에 연결하고 파일시스템 뷰를 마운트한다
    pub fn connect(config: &SessionConfig) -> Result<Self> {
        info!(
            "Connecting to pool {} (group {}, svc ranks {:?})",
            config.pool, config.group, config.svc_ranks
        );

        if !config.read_only {
            warn!("Read-write access requested; mounting read-only");
        }

        let root = config.mount_root.canonicalize().map_err(|e| {
            Error::Session(format!(
                "container 마운트 루트 '{}' 접근 실패: {}",
                config.mount_root.display(),
                e
            ))
        })?;
        if !root.is_dir() {
            return Err(Error::Session(format!(
                "container 마운트 루트가 디렉터리가 아님: {}",
                root.display()
            )));
        }

        info!("Mounted container {} at {}", config.container, root.display());

        Ok(Self {
            config: config.clone(),
            root,
            mounted: true,
        })
    }

    /// container 루트 경로
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(part) => resolved.push(part),
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(Error::LookupFailed {
                        path: path.to_string(),
                        reason: "path escapes the container root".into(),
                    });
                }
            }
        }
        Ok(resolved)
    }
}

impl Session for MountedSession {
    fn open_file(&self, path: &str) -> Result<(Box<dyn RemoteFile>, FileMetadata)> {
        if !self.mounted {
            return Err(Error::Session("파일시스템이 마운트되지 않음".into()));
        }

        let local = self.resolve(path)?;
        let lookup_err = |e: io::Error| Error::LookupFailed {
            path: path.to_string(),
            reason: match e.kind() {
                io::ErrorKind::NotFound => "no such file or directory".to_string(),
                io::ErrorKind::PermissionDenied => "permission denied".to_string(),
                _ => e.to_string(),
            },
        };

        let metadata = std::fs::metadata(&local).map_err(lookup_err)?;
        let file = File::open(&local).map_err(lookup_err)?;

        let meta = FileMetadata {
            size: metadata.len(),
            kind: FileKind::from_file_type(metadata.file_type()),
            mode: metadata.mode(),
        };
        debug!("Opened {} ({}, {} bytes)", local.display(), meta.kind, meta.size);

        Ok((Box::new(MountedFile { file }), meta))
    }

    fn close(&self, file: Box<dyn RemoteFile>) -> Result<()> {
        drop(file);
        Ok(())
    }

    fn unmount(&mut self) -> Result<()> {
        if self.mounted {
            self.mounted = false;
            info!(
                "Unmounted container {} and disconnected from pool {}",
                self.config.container, self.config.pool
            );
        }
        Ok(())
    }
}

impl Drop for MountedSession {
    fn drop(&mut self) {
        if let Err(e) = self.unmount() {
            warn!("Unmount failed: {}", e);
        }
    }
}

/// 마운트된 파일 핸들
struct MountedFile {
    file: File,
}

impl RemoteFile for MountedFile {
    /// 요청 크기를 채우거나 EOF에 도달할 때까지 읽는다 (짧은 읽기 = EOF)
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<ReadOutcome> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(ReadOutcome::from_len(filled))
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}
