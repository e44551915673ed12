//! Durable storage for a capability service's registry-assigned identity.

pub mod format;
pub mod identity;

pub use format::FileHeader;
pub use identity::InstanceIdentityStore;
