use std::path::{Path, PathBuf};

use config::{
    Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, Source,
    builder::DefaultState,
};
use serde::Deserialize;

/// Name of the optional settings file looked up in the working directory.
const SETTINGS_FILE: &str = "herc-reader";

pub const ENV_PREFIX: &str = "HERC_READER";

/// Deployment settings of the job.
///
/// Input file name, destination table and columns are not settings: they
/// are fixed by the job definition.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Directory holding the job's resources (`sample-data.csv`)
    pub resources_dir: PathBuf,
    pub database_url: String,
    /// Create the `people` table when missing before running
    pub initialize_schema: bool,
}

impl Settings {
    /// Loads defaults, then `herc-reader.toml` if present, then
    /// `HERC_READER_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`Settings::load`] with an explicit environment source.
    pub fn load_with(environment: Environment) -> Result<Self, ConfigError> {
        Self::layered(File::with_name(SETTINGS_FILE).required(false), environment)
    }

    /// Loads defaults overridden by the given TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn layered<S>(file: S, environment: Environment) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        Self::defaults()?
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("resources_dir", "resources")?
            .set_default("database_url", "sqlite://people.db")?
            .set_default("initialize_schema", true)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write, path::PathBuf};

    use config::{Environment, File};
    use tempfile::Builder;

    use super::{ENV_PREFIX, Settings};

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(vars))
    }

    #[test]
    fn defaults_apply_without_file() -> anyhow::Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file)?;

        let settings = Settings::load_from(file.path())?;

        assert_eq!(
            settings,
            Settings {
                resources_dir: PathBuf::from("resources"),
                database_url: "sqlite://people.db".to_string(),
                initialize_schema: true,
            }
        );
        Ok(())
    }

    #[test]
    fn file_overrides_defaults() -> anyhow::Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "database_url = \"sqlite://other.db\"")?;
        writeln!(file, "initialize_schema = false")?;

        let settings = Settings::load_from(file.path())?;

        assert_eq!(settings.database_url, "sqlite://other.db");
        assert!(!settings.initialize_schema);
        assert_eq!(settings.resources_dir, PathBuf::from("resources"));
        Ok(())
    }

    #[test]
    fn invalid_value_is_an_error() -> anyhow::Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "initialize_schema = \"sometimes\"")?;

        assert!(Settings::load_from(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn environment_overrides_defaults() -> anyhow::Result<()> {
        let settings = Settings::load_with(environment(&[
            ("HERC_READER_RESOURCES_DIR", "/srv/import"),
            ("HERC_READER_INITIALIZE_SCHEMA", "false"),
            ("OTHER_DATABASE_URL", "sqlite://ignored.db"),
        ]))?;

        assert_eq!(
            settings,
            Settings {
                resources_dir: PathBuf::from("/srv/import"),
                database_url: "sqlite://people.db".to_string(),
                initialize_schema: false,
            }
        );
        Ok(())
    }

    #[test]
    fn environment_overrides_settings_file() -> anyhow::Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "database_url = \"sqlite://file.db\"")?;
        writeln!(file, "resources_dir = \"from-file\"")?;

        let settings = Settings::layered(
            File::from(file.path()),
            environment(&[("HERC_READER_DATABASE_URL", "sqlite://env.db")]),
        )?;

        assert_eq!(settings.database_url, "sqlite://env.db");
        assert_eq!(settings.resources_dir, PathBuf::from("from-file"));
        assert!(settings.initialize_schema);
        Ok(())
    }

    #[test]
    fn invalid_environment_value_is_an_error() {
        let result = Settings::load_with(environment(&[(
            "HERC_READER_INITIALIZE_SCHEMA",
            "sometimes",
        )]));

        assert!(result.is_err());
    }
}
