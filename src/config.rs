use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{fmt::Debug, ops::RangeBounds, path::Path, path::PathBuf, time::Duration};

/// Monitor configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Window and page title.
    pub title: String,
    /// Upper bound on a single fetch from the record source, in seconds.
    pub fetch_timeout_secs: u64,
    /// Names of the document fields holding the reading.
    pub fields: FieldNames,
    /// Where measurements come from. `None` until given on the command line
    /// or chosen in the viewer.
    pub source: Option<SourceConfig>,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldNames {
    pub timestamp: String,
    pub value: String,
}

/// Record source selection, tagged by `kind`.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SourceConfig {
    Json { path: PathBuf },
    Csv { path: PathBuf },
    Parquet { path: PathBuf },
    DocumentApi(DocumentApiConfig),
}

/// A remote collection reached through an HTTP document API.
#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct DocumentApiConfig {
    /// Base URL of the API; `/action/find` is appended.
    pub url: String,
    /// Cluster name the API routes to.
    pub data_source: String,
    pub database: String,
    pub collection: String,
    /// Environment variable holding the API key. Keys never live in the file.
    pub api_key_env: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "SPL A-Weighted Monitor".to_string(),
            fetch_timeout_secs: 30,
            fields: FieldNames::default(),
            source: None,
        }
    }
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            timestamp: "timestamp".to_string(),
            value: "Value".to_string(),
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let text =
            std::fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&text)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("failed to deserialize config")?;
        config.validate().context("failed to validate config")?;
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.fetch_timeout_secs, 1..=3600).context("invalid fetch timeout")?;
        check_name(&self.fields.timestamp).context("invalid timestamp field name")?;
        check_name(&self.fields.value).context("invalid value field name")?;

        match &self.source {
            Some(SourceConfig::Json { path })
            | Some(SourceConfig::Csv { path })
            | Some(SourceConfig::Parquet { path }) => {
                if path.as_os_str().is_empty() {
                    bail!("source path must not be empty");
                }
            }
            Some(SourceConfig::DocumentApi(api)) => {
                if !(api.url.starts_with("https://") || api.url.starts_with("http://")) {
                    bail!("document API url must be http(s), but is {:?}", api.url);
                }
                check_name(&api.database).context("invalid database name")?;
                check_name(&api.collection).context("invalid collection name")?;
                check_name(&api.api_key_env).context("invalid API key variable")?;
            }
            None => {}
        }
        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("name must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fields.value, "Value");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn file_source_is_parsed() {
        let config = Config::from_toml(
            "fetch_timeout_secs = 5\n\
             [source]\n\
             kind = \"csv\"\n\
             path = \"data/spl.csv\"\n",
        )
        .unwrap();
        assert_eq!(
            config.source,
            Some(SourceConfig::Csv {
                path: PathBuf::from("data/spl.csv")
            })
        );
        assert_eq!(config.fetch_timeout_secs, 5);
    }

    #[test]
    fn document_api_source_is_parsed() {
        let config = Config::from_toml(
            "[fields]\n\
             value = \"LAeq\"\n\
             [source]\n\
             kind = \"document-api\"\n\
             url = \"https://data.example.net/app/spl/endpoint/data/v1\"\n\
             data_source = \"Cluster0\"\n\
             database = \"monitoring\"\n\
             collection = \"SPL_data\"\n\
             api_key_env = \"SPL_API_KEY\"\n",
        )
        .unwrap();
        assert_eq!(config.fields.value, "LAeq");
        assert_eq!(config.fields.timestamp, "timestamp");
        match config.source {
            Some(SourceConfig::DocumentApi(api)) => assert_eq!(api.collection, "SPL_data"),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn example_config_is_valid() {
        let config = Config::from_toml(include_str!("../monitor.example.toml")).unwrap();
        assert!(matches!(config.source, Some(SourceConfig::DocumentApi(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Config::from_toml("fetch_timeout_secs = 0").is_err());
    }

    #[test]
    fn blank_field_name_is_rejected() {
        assert!(Config::from_toml("[fields]\nvalue = \" \"").is_err());
    }

    #[test]
    fn non_http_url_is_rejected() {
        let result = Config::from_toml(
            "[source]\n\
             kind = \"document-api\"\n\
             url = \"mongodb+srv://cluster0.example.net\"\n\
             data_source = \"Cluster0\"\n\
             database = \"monitoring\"\n\
             collection = \"SPL_data\"\n\
             api_key_env = \"SPL_API_KEY\"\n",
        );
        assert!(result.is_err());
    }
}
