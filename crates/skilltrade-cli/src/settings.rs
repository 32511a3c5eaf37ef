//! Runtime settings for the `skilltrade` binary.
//!
//! Layered with the `config` crate: built-in defaults, then the optional TOML
//! file, then `SKILLTRADE_*` environment variables. Nested keys use a double
//! underscore, e.g. `SKILLTRADE_PASSWORD_POLICY__MIN_LENGTH=8`.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Deserialize;
use skilltrade_state::PasswordPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite file holding accounts, the current session, and profiles.
  #[serde(default = "Settings::default_database_path")]
  pub database_path:   PathBuf,
  /// Root directory for uploaded pictures.
  #[serde(default = "Settings::default_media_dir")]
  pub media_dir:       PathBuf,
  /// URL prefix under which `media_dir` is served.
  #[serde(default = "Settings::default_media_base_url")]
  pub media_base_url:  String,
  /// Directory for cached session artifacts.
  #[serde(default = "Settings::default_cache_dir")]
  pub cache_dir:       PathBuf,
  #[serde(default)]
  pub password_policy: PasswordPolicy,
}

impl Settings {
  fn default_database_path() -> PathBuf { PathBuf::from("~/.local/share/skilltrade/skilltrade.db") }

  fn default_media_dir() -> PathBuf { PathBuf::from("~/.local/share/skilltrade/media") }

  fn default_media_base_url() -> String { "file:///media".to_owned() }

  fn default_cache_dir() -> PathBuf { PathBuf::from("~/.cache/skilltrade") }

  /// Read settings from `file` (if it exists) and the environment.
  pub fn load(file: &Path) -> Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("SKILLTRADE")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read settings")?;

    let settings: Self = raw
      .try_deserialize()
      .context("failed to deserialise settings")?;
    Ok(settings.expanded())
  }

  /// Resolve a leading `~` in every path.
  fn expanded(self) -> Self {
    Self {
      database_path: expand_tilde(&self.database_path),
      media_dir: expand_tilde(&self.media_dir),
      cache_dir: expand_tilde(&self.cache_dir),
      ..self
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn file_values_override_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
      file,
      "database_path = \"/tmp/st.db\"\nmedia_base_url = \"http://cdn.test/\"\n\n[password_policy]\nmin_length = 10"
    )
    .unwrap();

    let settings = Settings::load(file.path()).unwrap();
    assert_eq!(settings.database_path, PathBuf::from("/tmp/st.db"));
    assert_eq!(settings.media_base_url, "http://cdn.test/");
    assert_eq!(settings.password_policy.min_length, 10);
  }

  #[test]
  fn missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.password_policy, PasswordPolicy::default());
    assert!(settings.database_path.ends_with("skilltrade.db"));
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x/y")), PathBuf::from(home).join("x/y"));
    assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
  }
}
