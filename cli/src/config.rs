use std::io;
use std::path::{Path, PathBuf};

use renderer::RenderOptions;
use thiserror::Error;

/// Looked up next to the source file when no `--config` is given.
pub const CONFIG_FILE: &str = "mddoc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub fn load(path: &Path) -> Result<RenderOptions, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Options for converting `source`: the explicit config if one was given,
/// else `mddoc.toml` beside the source, else defaults.
pub fn resolve(explicit: Option<&Path>, source: &Path) -> Result<RenderOptions, ConfigError> {
    if let Some(path) = explicit {
        return load(path);
    }
    let candidate = source
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(CONFIG_FILE);
    if candidate.is_file() {
        log::debug!("using config {}", candidate.display());
        load(&candidate)
    } else {
        Ok(RenderOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::SoftBreak;

    #[test]
    fn sibling_config_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "soft_break = \"space\"\nfont = \"Georgia\"\n",
        )
        .unwrap();
        let source = dir.path().join("doc.md");

        let options = resolve(None, &source).unwrap();
        assert_eq!(options.soft_break, SoftBreak::Space);
        assert_eq!(options.font, "Georgia");
        assert_eq!(options.font_size, 12.0);
    }

    #[test]
    fn missing_sibling_config_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let options = resolve(None, &dir.path().join("doc.md")).unwrap();
        assert_eq!(options, RenderOptions::default());
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            resolve(Some(&missing), &dir.path().join("doc.md")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "fontsize = 3\n").unwrap();
        assert!(matches!(load(&path), Err(ConfigError::Parse { .. })));
    }
}
