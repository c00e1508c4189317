//! Device identity
//!
//! Every replica that edits a shared document is named by a [`DeviceId`].

mod device_id;

pub use device_id::{DeviceId, DEFAULT_GENERATED_PREFIX, MAX_DEVICE_ID_LEN};
