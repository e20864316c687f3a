use std::future::Future;
use std::io::Write;
use std::path::Path;

use image::ImageReader;
use tracing::debug;

use super::{ImageSource, LoadError, is_remote};
use crate::compare::PixelBuffer;

/// Loads local paths directly and materializes URLs into a temporary file
/// before decoding them the same way.
#[derive(Clone, Default)]
pub struct FileOrUrlSource {
    client: reqwest::Client,
}

impl FileOrUrlSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn download(&self, url: &str) -> Result<tempfile::NamedTempFile, LoadError> {
        let fetch_err = |source| LoadError::Fetch {
            reference: url.to_string(),
            source,
        };
        let io_err = |source| LoadError::Io {
            reference: url.to_string(),
            source,
        };

        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?
            .bytes()
            .await
            .map_err(fetch_err)?;
        debug!(url, bytes = bytes.len(), "downloaded");

        let mut file = tempfile::NamedTempFile::new().map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        Ok(file)
    }
}

/// Decode any format the `image` crate recognizes and widen to 16-bit RGBA.
pub fn decode_file(reference: &str, path: &Path) -> Result<PixelBuffer, LoadError> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound {
                    reference: reference.to_string(),
                }
            } else {
                LoadError::Io {
                    reference: reference.to_string(),
                    source,
                }
            }
        })?;
    let image = reader.decode().map_err(|source| LoadError::Decode {
        reference: reference.to_string(),
        source,
    })?;
    Ok(image.to_rgba16())
}

impl ImageSource for FileOrUrlSource {
    fn load(&self, reference: &str) -> impl Future<Output = Result<PixelBuffer, LoadError>> + Send {
        let reference = reference.to_string();
        async move {
            let temp = if is_remote(&reference) {
                Some(self.download(&reference).await?)
            } else {
                None
            };

            // Decoding is CPU bound; keep it off the async workers.
            let task_ref = reference.clone();
            tokio::task::spawn_blocking(move || {
                let path = match &temp {
                    Some(file) => file.path(),
                    None => Path::new(&task_ref),
                };
                decode_file(&task_ref, path)
            })
            .await
            .map_err(|_| LoadError::Interrupted { reference })?
        }
    }
}
