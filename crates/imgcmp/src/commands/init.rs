use std::path::Path;

use anyhow::{Result, bail};

use crate::config;

/// `imgcmp init`: create imgcmp.toml in the working directory.
pub fn init(force: bool) -> Result<()> {
    if !force && config::config_file_exists() {
        bail!("{} already exists (use --force to overwrite)", config::CONFIG_FILE);
    }

    config::write_template(Path::new(config::CONFIG_FILE))?;

    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} {}", config::CONFIG_FILE);
    Ok(())
}
