use std::path::{Path, PathBuf};

use resin_core::Config;

use crate::error::ToolError;

const HOST_ENV: &str = "RESIN_HOST";

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("resin").join("config.toml"))
}

pub fn parse_config(content: &str) -> Result<Config, ToolError> {
    Ok(toml::from_str(content)?)
}

/// Loads the build configuration.
///
/// An explicit path must exist. Without one, the user config file is used
/// when present, else the defaults. `RESIN_HOST` overrides `host`.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ToolError> {
    let mut config = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ToolError::ConfigNotFound(path.to_path_buf()));
            }
            parse_config(&std::fs::read_to_string(path)?)?
        }
        None => match config_path().filter(|p| p.exists()) {
            Some(path) => parse_config(&std::fs::read_to_string(path)?)?,
            None => Config::default(),
        },
    };

    if let Ok(host) = std::env::var(HOST_ENV) {
        if !host.is_empty() {
            config.host = host;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use resin_core::{AssetMatching, RelationPolicy};
    use std::io::Write;

    #[test]
    fn parse_full_config() {
        let config = parse_config(
            r#"
host = "https://cms.example.com"
available_lngs = ["en", "de"]
custom_components = ["gallery", "teaser"]
edge_suffix = "___NODE"
static_prefix = "/static/"
asset_matching = "substring"
on_missing_relation = "fail"
"#,
        )
        .unwrap();

        assert_eq!(config.host, "https://cms.example.com");
        assert_eq!(config.available_lngs, vec!["en", "de"]);
        assert!(config.is_custom_component("teaser"));
        assert_eq!(config.asset_matching, AssetMatching::Substring);
        assert_eq!(config.on_missing_relation, RelationPolicy::Fail);
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn parse_rejects_unknown_policy() {
        assert!(matches!(
            parse_config(r#"on_missing_relation = "explode""#),
            Err(ToolError::Config(_))
        ));
    }

    #[test]
    fn explicit_path_must_exist() {
        let missing = Path::new("/nonexistent/resin.toml");
        assert!(matches!(
            load_config(Some(missing)),
            Err(ToolError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn explicit_path_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"custom_components = ["hero"]"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();

        assert!(config.is_custom_component("hero"));
    }
}
