use std::path::Path;

use anyhow::{Context, Result};

use super::CONFIG_FILE;

/// Hand-crafted config template with commented-out keys.
/// Used by `imgcmp init` so users can see the available knobs
/// without looking them up.
const CONFIG_TEMPLATE: &str = r#"# imgcmp configuration. CLI flags and IMGCMP_* variables override these.

# ─────────────────────────────────────────────────────────
# Comparison. All fields optional.
# ─────────────────────────────────────────────────────────
[diff]
# comparator = "distance"           # "distance" | "kernel"
# tolerance = 255                   # max mean channel delta (of 65535) per pixel
# kernel_size = 3                   # 1-255, blocks span (K+1)x(K+1) pixels
# kernel_threshold = 16             # max averaged block delta (of 255)

# ─────────────────────────────────────────────────────────
# Batch runs. All fields optional.
# ─────────────────────────────────────────────────────────
[batch]
# workers = 8                       # default: number of CPUs
# job_timeout_secs = 60             # default: no timeout
"#;

pub fn config_file_exists() -> bool {
    Path::new(CONFIG_FILE).exists()
}

/// Write the template to `path`.
pub fn write_template(path: &Path) -> Result<()> {
    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn template_parses_to_defaults() {
        let config = Config::parse(CONFIG_TEMPLATE).unwrap();
        assert!(config.diff.tolerance.is_none());
        assert!(config.batch.workers.is_none());
    }

    #[test]
    fn writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        write_template(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }
}
