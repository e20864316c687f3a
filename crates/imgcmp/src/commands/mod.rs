mod batch;
mod compare;
mod info;
mod init;

pub use self::batch::batch;
pub use self::compare::compare;
pub use self::info::info;
pub use self::init::init;

/// Every compared pair matched.
pub const EXIT_OK: i32 = 0;
/// At least one pair differs, or a batch job could not be resolved.
pub const EXIT_DIFFERS: i32 = 98;
