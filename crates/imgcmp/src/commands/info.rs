use anyhow::Result;

use crate::source::{FileOrUrlSource, ImageSource};

/// `imgcmp info`: load one image and print its dimensions.
pub async fn info(image: &str) -> Result<()> {
    let img = FileOrUrlSource::new().load(image).await?;
    println!("image dimensions: {}x{}", img.width(), img.height());
    Ok(())
}
