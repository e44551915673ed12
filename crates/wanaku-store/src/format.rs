//! On-disk layout of the instance identity file.
//!
//! ```text
//! offset 0   : 6 bytes  format tag "wanaku"
//! offset 6   : i32 LE   file version
//! offset 10  : i32 LE   service type code
//! offset 14  : 6 bytes  reserved
//! offset 20  : 36 bytes service id
//! offset 56  : 4 bytes  reserved
//! ```

use wanaku_core::{SERVICE_ID_LEN, ServiceEntry, ServiceType, WanakuError};

pub const FORMAT_TAG: &[u8; 6] = b"wanaku";
pub const FILE_VERSION: i32 = 1;

pub const HEADER_LEN: usize = 20;
pub const ENTRY_LEN: usize = 40;

const VERSION_OFFSET: usize = 6;
const TYPE_OFFSET: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: i32,
    pub service_type: ServiceType,
}

impl FileHeader {
    pub fn new(service_type: ServiceType) -> Self {
        Self {
            version: FILE_VERSION,
            service_type,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[..FORMAT_TAG.len()].copy_from_slice(FORMAT_TAG);
        buf[VERSION_OFFSET..TYPE_OFFSET].copy_from_slice(&self.version.to_le_bytes());
        buf[TYPE_OFFSET..TYPE_OFFSET + 4].copy_from_slice(&self.service_type.code().to_le_bytes());
        buf
    }

    /// Returns a human readable reason when the header is not usable.
    pub fn decode(buf: &[u8]) -> Result<Self, String> {
        if buf.len() < HEADER_LEN {
            return Err(format!("header is {} bytes, expected {HEADER_LEN}", buf.len()));
        }
        if &buf[..FORMAT_TAG.len()] != FORMAT_TAG {
            return Err("missing wanaku format tag".to_string());
        }

        let version = read_i32(&buf[VERSION_OFFSET..TYPE_OFFSET]);
        if version != FILE_VERSION {
            return Err(format!("unsupported file version {version}"));
        }

        let code = read_i32(&buf[TYPE_OFFSET..TYPE_OFFSET + 4]);
        let service_type = ServiceType::try_from(code).map_err(|e| e.to_string())?;

        Ok(Self {
            version,
            service_type,
        })
    }
}

pub fn encode_entry(entry: &ServiceEntry) -> [u8; ENTRY_LEN] {
    let mut buf = [0u8; ENTRY_LEN];
    buf[..SERVICE_ID_LEN].copy_from_slice(entry.id().as_bytes());
    buf
}

pub fn decode_entry(buf: &[u8]) -> Result<ServiceEntry, String> {
    if buf.len() < ENTRY_LEN {
        return Err(format!("entry is {} bytes, expected {ENTRY_LEN}", buf.len()));
    }
    let raw = &buf[..SERVICE_ID_LEN];
    let id = std::str::from_utf8(raw).map_err(|e| format!("service id is not UTF-8: {e}"))?;
    ServiceEntry::new(id).map_err(|e: WanakuError| e.to_string())
}

fn read_i32(bytes: &[u8]) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    i32::from_le_bytes(raw)
}
