pub mod annotations;
pub mod crd;
pub mod meta;

/// Values written into the `status.status` field of user-facing resources.
pub const STATUS_ACTIVE: &str = "Active";
pub const STATUS_PROVISIONING: &str = "Provisioning";
pub const STATUS_FAILURE: &str = "Failure";

/// `status.message` on a healthy sync.
pub const MESSAGE_SUCCESS: &str = "Success";
