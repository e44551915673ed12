use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use wanaku_core::{ServiceEntry, ServiceTarget, WanakuError, WanakuResult};

use crate::format::{self, ENTRY_LEN, FileHeader, HEADER_LEN};

const FILE_SUFFIX: &str = ".wanaku.dat";

/// Persists the registry-assigned service id so it survives restarts.
///
/// The file is written once per `(data_dir, service_name)` and never
/// overwritten afterwards.
#[derive(Debug, Clone)]
pub struct InstanceIdentityStore {
    path: PathBuf,
}

impl InstanceIdentityStore {
    /// Fails with `InvalidArgument` when `service_name` is not a plain file
    /// name component.
    pub fn new(data_dir: impl AsRef<Path>, service_name: &str) -> WanakuResult<Self> {
        Ok(Self {
            path: Self::file_path(data_dir, service_name)?,
        })
    }

    pub fn file_path(data_dir: impl AsRef<Path>, service_name: &str) -> WanakuResult<PathBuf> {
        check_service_name(service_name)?;
        Ok(data_dir
            .as_ref()
            .join(format!("{service_name}{FILE_SUFFIX}")))
    }

    pub fn exists_in(data_dir: impl AsRef<Path>, service_name: &str) -> bool {
        Self::file_path(data_dir, service_name).is_ok_and(|path| path.is_file())
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the header and the target's id unless the file already exists.
    pub fn write(&self, target: &ServiceTarget) -> Result<(), WanakuError> {
        let id = target
            .id()
            .ok_or_else(|| WanakuError::InvalidArgument("service target has no id".to_string()))?;
        let entry = ServiceEntry::new(id)?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        fs::create_dir_all(dir)?;

        let mut buf = Vec::with_capacity(HEADER_LEN + ENTRY_LEN);
        buf.extend_from_slice(&FileHeader::new(target.service_type).encode());
        buf.extend_from_slice(&format::encode_entry(&entry));

        // Only a complete, synced file is ever linked under the final name.
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(&buf)?;
        staged.as_file().sync_all()?;

        match staged.persist_noclobber(&self.path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                self.load()?;
                debug!(path = %self.path.display(), "identity file already present, keeping it");
                return Ok(());
            }
            Err(e) => return Err(e.error.into()),
        }

        info!(path = %self.path.display(), id = entry.id(), "persisted service identity");
        Ok(())
    }

    /// Reads the persisted header; `None` when there is no file yet.
    pub fn read_header(&self) -> Result<Option<FileHeader>, WanakuError> {
        Ok(self.load()?.map(|(header, _)| header))
    }

    /// Reads the persisted entry; `None` when there is no file yet.
    pub fn read(&self) -> Result<Option<ServiceEntry>, WanakuError> {
        Ok(self.load()?.map(|(_, entry)| entry))
    }

    fn load(&self) -> Result<Option<(FileHeader, ServiceEntry)>, WanakuError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let header = FileHeader::decode(&bytes).map_err(|reason| self.corrupt(reason))?;

        let entry =
            format::decode_entry(&bytes[HEADER_LEN..]).map_err(|reason| self.corrupt(reason))?;

        Ok(Some((header, entry)))
    }

    fn corrupt(&self, reason: String) -> WanakuError {
        WanakuError::CorruptIdentityFile {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

fn check_service_name(name: &str) -> WanakuResult<()> {
    let mut parts = Path::new(name).components();
    let single = matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None));
    if !single || name.contains(['/', '\\', '\0']) {
        return Err(WanakuError::InvalidArgument(format!(
            "service name {name:?} cannot be used as an identity file name"
        )));
    }
    Ok(())
}
