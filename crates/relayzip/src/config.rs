//! Layered settings: built-in defaults, then an optional TOML file, then
//! environment variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use relayzip_fetch::{ClientSetting, DEFAULT_CHUNK_SIZE};
use relayzip_sink::{FsSink, SinkRouter};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, SettingsError};

/// Prefix for environment overrides, e.g. `RELAYZIP_BASE_DIR`.
pub const ENV_PREFIX: &str = "RELAYZIP_";

/// One selectable download: where to find the link, what it looks like, and
/// what extension the extracted file gets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Index page, absolute or relative to [`Settings::base_url`].
    pub page: String,
    /// Regex the whole href must match.
    pub pattern: String,
    pub extension: String,
}

impl SourceConfig {
    pub fn new(page: &str, pattern: &str, extension: &str) -> Self {
        Self {
            page: page.to_string(),
            pattern: pattern.to_string(),
            extension: extension.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base for index pages and for relative download links.
    pub base_url: String,
    /// Sink root such as `file://bucket` or `mem://out`.
    pub destination: Option<String>,
    /// Bucket to use when no destination is given; also read from the bare
    /// `BUCKET_NAME` environment variable.
    pub bucket_name: Option<String>,
    /// Local directory that `file://` buckets live under.
    pub local_root: PathBuf,
    pub base_dir: String,
    pub output_prefix: String,
    pub chunk_size: usize,
    pub http: ClientSetting,
    pub sources: BTreeMap<String, SourceConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        let sources = BTreeMap::from([
            (
                "basic".to_string(),
                SourceConfig::new(
                    "en_output.html",
                    r"BasicCompanyDataAsOneFile-20[0-9][0-9]-[0-1][0-9]-[0-3][0-9]\.zip",
                    "csv",
                ),
            ),
            (
                "psc".to_string(),
                SourceConfig::new(
                    "en_pscdata.html",
                    r"persons-with-significant-control-snapshot-20[0-9][0-9]-[0-1][0-9]-[0-3][0-9]\.zip",
                    "json",
                ),
            ),
        ]);

        Self {
            base_url: "https://download.companieshouse.gov.uk".to_string(),
            destination: None,
            bucket_name: None,
            local_root: PathBuf::from("."),
            base_dir: "companies_house".to_string(),
            output_prefix: "companies_house_".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            http: ClientSetting::default(),
            sources,
        }
    }
}

impl Settings {
    /// The provider stack behind [`Settings::load`].
    ///
    /// Nested keys use a double underscore: `RELAYZIP_HTTP__TIMEOUT_SECS=30`.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::raw().only(&["BUCKET_NAME"]))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = config_file
            && !path.is_file()
        {
            return Err(SettingsError::MissingFile(path.to_path_buf()));
        }
        Ok(Self::figment(config_file).extract()?)
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn source(&self, selector: &str) -> Option<&SourceConfig> {
        self.sources.get(selector)
    }

    /// Sink root, falling back to `file://{bucket_name}`.
    pub fn destination(&self) -> Result<String, PipelineError> {
        if let Some(destination) = &self.destination {
            return Ok(destination.trim_end_matches('/').to_string());
        }
        match &self.bucket_name {
            Some(bucket) if !bucket.is_empty() => Ok(format!("file://{bucket}")),
            _ => Err(PipelineError::Configuration(
                "no destination configured: set \"destination\" or BUCKET_NAME".to_string(),
            )),
        }
    }

    /// Backends for a standalone run: `file://` buckets under
    /// [`local_root`](Self::local_root). `mem://` is left out because
    /// nothing would outlive the process.
    pub fn sink_router(&self) -> SinkRouter {
        SinkRouter::new().with_fs(FsSink::new(&self.local_root))
    }

    /// `{destination}/{base_dir}/{output_prefix}{selector}.{extension}`
    pub fn sink_path(&self, selector: &str, source: &SourceConfig) -> Result<String, PipelineError> {
        let mut path = self.destination()?;
        let base_dir = self.base_dir.trim_matches('/');
        if !base_dir.is_empty() {
            path.push('/');
            path.push_str(base_dir);
        }
        path.push('/');
        path.push_str(&self.output_prefix);
        path.push_str(selector);
        path.push('.');
        path.push_str(&source.extension);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_both_downloads() {
        let settings = Settings::default();
        assert_eq!(settings.selectors().collect::<Vec<_>>(), ["basic", "psc"]);
        assert_eq!(settings.source("psc").unwrap().extension, "json");
        assert_eq!(settings.chunk_size, 64 * 1024);
    }

    #[test]
    fn sink_path_layout() {
        let settings = Settings {
            destination: Some("mem://out/".to_string()),
            ..Settings::default()
        };
        let basic = settings.source("basic").unwrap();
        assert_eq!(
            settings.sink_path("basic", basic).unwrap(),
            "mem://out/companies_house/companies_house_basic.csv"
        );

        let flat = Settings {
            destination: Some("mem://out".to_string()),
            base_dir: String::new(),
            output_prefix: String::new(),
            ..Settings::default()
        };
        assert_eq!(flat.sink_path("basic", basic).unwrap(), "mem://out/basic.csv");
    }

    #[test]
    fn bucket_name_is_the_fallback_destination() {
        let settings = Settings {
            bucket_name: Some("landing".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.destination().unwrap(), "file://landing");

        let err = Settings::default().destination().unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn layered_loading() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "relayzip.toml",
                r#"
                base_dir = "ch"

                [http]
                user_agent = "relayzip-test"

                [sources.officers]
                page = "officers.html"
                pattern = 'officers-\d+\.zip'
                extension = "txt"
                "#,
            )?;
            jail.set_env("BUCKET_NAME", "landing");
            jail.set_env("RELAYZIP_CHUNK_SIZE", "1024");
            jail.set_env("RELAYZIP_HTTP__TIMEOUT_SECS", "30");

            let settings: Settings =
                Settings::figment(Some(Path::new("relayzip.toml"))).extract()?;
            assert_eq!(settings.base_dir, "ch");
            assert_eq!(settings.chunk_size, 1024);
            assert_eq!(settings.http.user_agent.as_deref(), Some("relayzip-test"));
            assert_eq!(settings.http.timeout_secs, Some(30));
            assert_eq!(settings.bucket_name.as_deref(), Some("landing"));
            assert_eq!(
                settings.selectors().collect::<Vec<_>>(),
                ["basic", "officers", "psc"]
            );
            Ok(())
        });
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = Settings::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::MissingFile(_)));
    }
}
