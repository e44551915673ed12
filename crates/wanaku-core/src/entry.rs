use crate::errors::WanakuError;

/// Length in bytes of a persisted service id (UUID text form).
pub const SERVICE_ID_LEN: usize = 36;

/// A registry-assigned service id as persisted in the identity file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    id: String,
}

impl ServiceEntry {
    /// Ids of any other byte length are rejected instead of being padded
    /// or truncated on disk.
    pub fn new(id: impl Into<String>) -> Result<Self, WanakuError> {
        let id = id.into();
        if id.len() != SERVICE_ID_LEN {
            return Err(WanakuError::InvalidArgument(format!(
                "service id must be {SERVICE_ID_LEN} bytes, got {} ({id:?})",
                id.len()
            )));
        }
        Ok(Self { id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn into_id(self) -> String {
        self.id
    }
}
