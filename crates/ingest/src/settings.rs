use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use parley_message::{IngestOptions, MessageFormat, PartTypePolicy};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub const SETTINGS_DIRECTORY_NAME: &str = "parley";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_ENV_PREFIX: &str = "PARLEY_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Format assumed for messages that do not name one.
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default)]
    pub reject_unknown_part_types: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            reject_unknown_part_types: false,
        }
    }
}

impl IngestSettings {
    pub fn normalized(mut self) -> Self {
        let trimmed = self.default_format.trim().to_ascii_lowercase();
        self.default_format = match MessageFormat::parse(&trimmed) {
            Some(format) => format.as_str().to_string(),
            None => {
                tracing::warn!(
                    default_format = %trimmed,
                    "unsupported default format in settings, falling back to none"
                );
                default_format()
            }
        };
        self
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            default_format: MessageFormat::parse(&self.default_format)
                .unwrap_or(MessageFormat::None),
            part_types: if self.reject_unknown_part_types {
                PartTypePolicy::RejectUnknown
            } else {
                PartTypePolicy::PassThrough
            },
        }
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<IngestSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".parley"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<IngestSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: IngestSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_disk(path: &Path) -> IngestSettings {
        let mut figment = Figment::from(Serialized::defaults(IngestSettings::default()));
        if path.exists() {
            figment = figment.merge(Json::file(path));
        } else {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }
        figment = figment.merge(Env::prefixed(SETTINGS_ENV_PREFIX));

        match figment.extract::<IngestSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                IngestSettings::default()
            }
        }
    }

    /// Writes next to the target and renames over it, so a crash mid-save
    /// leaves either the old or the new settings on disk.
    fn persist(&self, settings: &IngestSettings) -> Result<(), SettingsError> {
        let directory = self
            .config_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty());
        if let Some(directory) = directory {
            std::fs::create_dir_all(directory).context(CreateConfigDirSnafu {
                stage: "persist-ingest-settings-dir",
                directory: directory.to_path_buf(),
            })?;
        }

        let encoded = serde_json::to_vec_pretty(settings).context(EncodeSettingsSnafu {
            stage: "persist-ingest-settings-encode",
        })?;

        let staging_path = self.staging_path();
        std::fs::write(&staging_path, encoded).context(WriteStagingSnafu {
            stage: "persist-ingest-settings-stage",
            staging_path: staging_path.clone(),
        })?;
        std::fs::rename(&staging_path, &self.config_path).context(CommitStagingSnafu {
            stage: "persist-ingest-settings-commit",
            config_path: self.config_path.clone(),
        })?;

        tracing::info!(
            config_path = %self.config_path.display(),
            default_format = %settings.default_format,
            reject_unknown_part_types = settings.reject_unknown_part_types,
            "stored ingest settings"
        );
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        self.config_path.with_extension("json.tmp")
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("cannot create ingest config directory {}: {source}", directory.display()))]
    CreateConfigDir {
        stage: &'static str,
        directory: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot encode ingest settings: {source}"))]
    EncodeSettings {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("cannot stage ingest settings at {}: {source}", staging_path.display()))]
    WriteStaging {
        stage: &'static str,
        staging_path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot replace ingest settings at {}: {source}", config_path.display()))]
    CommitStaging {
        stage: &'static str,
        config_path: PathBuf,
        source: std::io::Error,
    },
}

fn default_format() -> String {
    MessageFormat::None.as_str().to_string()
}
