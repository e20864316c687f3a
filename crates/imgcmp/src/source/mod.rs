pub mod fetch;

use std::future::Future;

use thiserror::Error;

use crate::compare::PixelBuffer;

pub use self::fetch::FileOrUrlSource;

/// Failure to acquire one image reference.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error reading '{reference}' ({source})")]
    Io {
        reference: String,
        source: std::io::Error,
    },
    #[error("error reading '{reference}' ({source})")]
    Fetch {
        reference: String,
        source: reqwest::Error,
    },
    #[error("error reading '{reference}' ({source})")]
    Decode {
        reference: String,
        source: image::ImageError,
    },
    #[error("error reading '{reference}' (decode task did not finish)")]
    Interrupted { reference: String },
    #[error("error reading '{reference}' (not found)")]
    NotFound { reference: String },
}

/// Turns a reference string (path or URL) into decoded pixels.
///
/// Each call performs exactly one acquisition attempt.
pub trait ImageSource: Send + Sync + 'static {
    fn load(&self, reference: &str) -> impl Future<Output = Result<PixelBuffer, LoadError>> + Send;
}

/// Whether `reference` names a remote resource rather than a local path.
pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}
