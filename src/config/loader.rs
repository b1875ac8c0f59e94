use crate::config::schema::{RulesFile, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    /// The rules file the error came from, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path.as_path()),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }

    fn with_path(self, path: &Path) -> Self {
        let path = Some(path.to_path_buf());
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml { path, source },
            ConfigError::Validation { path: None, source } => {
                ConfigError::Validation { path, source }
            }
            other => other,
        }
    }
}

fn origin(path: Option<&Path>) -> String {
    path.map_or_else(|| "<inline rules>".to_string(), |path| path.display().to_string())
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot open rules file {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => {
                write!(f, "{} is not a valid rules file: {}", origin(path.as_deref()), source)
            }
            ConfigError::Validation { path, source } => {
                let count = source.issues.len();
                write!(f, "{} has {} problem(s):", origin(path.as_deref()), count)?;
                for issue in &source.issues {
                    write!(f, "\n  - {issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RulesFile, ConfigError> {
    let rules: RulesFile = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    rules
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(rules)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RulesFile, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::Dialect;

    #[test]
    fn loads_options_and_rules() {
        let input = r#"
[options]
dialect = "ts"
placeholder_prefix = "__"

[[rules]]
id = "log-to-debug"
pattern = "console.log(__X)"
template = "logger.debug(__X)"

[[rules]]
id = "find-evals"
pattern = "eval(__CODE)"
"#;
        let file = load_from_str(input).unwrap();
        assert_eq!(file.options.dialect, Dialect::TypeScript);
        assert_eq!(file.options.placeholder_prefix, "__");
        assert!(!file.options.debug);
        assert_eq!(file.rules.len(), 2);
        assert!(file.rules[1].is_find_only());
    }

    #[test]
    fn missing_options_use_defaults() {
        let file = load_from_str("[[rules]]\nid = \"a\"\npattern = \"f()\"\n").unwrap();
        assert_eq!(file.options.placeholder_prefix, "$$");
    }

    #[test]
    fn unknown_option_is_a_toml_error() {
        let err = load_from_str("[options]\ncolour = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }

    #[test]
    fn validation_errors_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        fs::write(&path, "rules = []\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { path: Some(_), .. }));
        assert!(err.to_string().contains("rules.toml"));
    }

    #[test]
    fn validation_message_lists_every_issue() {
        let err = load_from_str("[[rules]]\nid = \"a\"\n\n[[rules]]\nid = \"a\"\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "<inline rules> has 3 problem(s):\n  \
             - rule 'a' missing required field 'pattern'\n  \
             - rule id 'a' is used more than once\n  \
             - rule 'a' missing required field 'pattern'"
        );
        assert!(err.path().is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_from_path("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
