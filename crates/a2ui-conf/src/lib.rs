use camino::Utf8Path;
use camino::Utf8PathBuf;
use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE: &str = "a2ui.toml";
const DOT_CONFIG_FILE: &str = ".a2ui.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
}

/// Whether messages pass through the structural validator before they are
/// applied to a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustMode {
    /// Validate every message and reject it on the first violation.
    Validate,
    /// Apply messages as they come; the tree builder degrades gracefully.
    #[default]
    Permissive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    max_global_depth: usize,
    max_function_call_depth: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_global_depth: 50,
            max_function_call_depth: 5,
        }
    }
}

impl ValidationSettings {
    #[must_use]
    pub fn max_global_depth(&self) -> usize {
        self.max_global_depth
    }

    #[must_use]
    pub fn max_function_call_depth(&self) -> usize {
        self.max_function_call_depth
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    trust: TrustMode,
}

impl ProcessingSettings {
    #[must_use]
    pub fn trust(&self) -> TrustMode {
        self.trust
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    debug: bool,
    validation: ValidationSettings,
    processing: ProcessingSettings,
}

impl Settings {
    pub fn new(project_root: &Utf8Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("com.github", "a2ui", "a2ui")
            .and_then(|proj_dirs| {
                Utf8PathBuf::from_path_buf(proj_dirs.config_dir().join(CONFIG_FILE)).ok()
            });

        Self::load_from_paths(project_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        project_root: &Utf8Path,
        user_config_path: Option<&Utf8Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(
                File::from(path.as_std_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            File::from(project_root.join(DOT_CONFIG_FILE).as_std_path())
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join(CONFIG_FILE).as_std_path())
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        tracing::debug!(?settings, %project_root, "Loaded settings");
        Ok(settings)
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub fn validation(&self) -> ValidationSettings {
        self.validation
    }

    #[must_use]
    pub fn processing(&self) -> ProcessingSettings {
        self.processing
    }

    #[must_use]
    pub fn trust(&self) -> TrustMode {
        self.processing.trust
    }
}
