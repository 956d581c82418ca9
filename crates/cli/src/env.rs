use crate::error::CliError;
use std::{collections::HashMap, fs, path::Path, str::FromStr};

/// Connection and export variables recognised as flag fallbacks.
pub const PGHOST: &str = "PGHOST";
pub const PGPORT: &str = "PGPORT";
pub const PGDATABASE: &str = "PGDATABASE";
pub const PGUSER: &str = "PGUSER";
pub const PGPASSWORD: &str = "PGPASSWORD";
pub const PGSSLMODE: &str = "PGSSLMODE";
pub const PGAPPNAME: &str = "PGAPPNAME";
pub const EXPORT_DAY: &str = "EXPORT_DAY";
pub const EXPORT_OUTPUT_DIR: &str = "EXPORT_OUTPUT_DIR";

/// Snapshot of the process environment, optionally extended by a `.env` file.
///
/// Values from the file never replace variables already set in the process.
#[derive(Debug, Clone, Default)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

impl EnvManager {
    pub fn new() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvManager {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load variables from a .env file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read env file {}: {}", path.display(), e))
        })?;

        self.parse_env_content(&content)
    }

    /// Non-blank value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// Parses `key` if set; `name` labels the value in errors.
    pub fn parse<T>(&self, name: &'static str, key: &str) -> Result<Option<T>, CliError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| CliError::InvalidValue {
                    name,
                    reason: format!("{key}={raw}: {e}"),
                })
            })
            .transpose()
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), CliError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid env file: malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Config(format!(
                    "Invalid env file: empty key at line {}",
                    line_num + 1
                )));
            }

            self.vars
                .entry(key.to_string())
                .or_insert_with(|| unquote_value(value));
        }

        Ok(())
    }
}

fn unquote_value(value: &str) -> String {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> EnvManager {
        EnvManager::from_vars(Vec::<(String, String)>::new())
    }

    #[test]
    fn test_parse_basic_env() {
        let mut env = empty();
        let content = r#"
# Comment
PGHOST=db.internal
export PGPORT=6432
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get(PGHOST), Some("db.internal"));
        assert_eq!(env.parse::<u16>("port", PGPORT).unwrap(), Some(6432));
    }

    #[test]
    fn test_parse_quoted_values() {
        let mut env = empty();
        let content = r#"
QUOTED="value with spaces"
SINGLE='single quoted'
UNQUOTED=no_spaces
EQUALS=a=b
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("QUOTED"), Some("value with spaces"));
        assert_eq!(env.get("SINGLE"), Some("single quoted"));
        assert_eq!(env.get("UNQUOTED"), Some("no_spaces"));
        assert_eq!(env.get("EQUALS"), Some("a=b"));
    }

    #[test]
    fn test_file_does_not_override_process_vars() {
        let mut env = EnvManager::from_vars([(PGUSER, "from_process")]);
        env.parse_env_content("PGUSER=from_file\nPGDATABASE=shop")
            .unwrap();

        assert_eq!(env.get(PGUSER), Some("from_process"));
        assert_eq!(env.get(PGDATABASE), Some("shop"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "EXPORT_DAY=2025-12-07\n").unwrap();

        let mut env = empty();
        env.load_from_file(&path).unwrap();
        assert_eq!(env.get(EXPORT_DAY), Some("2025-12-07"));

        assert!(matches!(
            env.load_from_file(dir.path().join("missing.env")),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_env_format() {
        let mut env = empty();
        assert!(env.parse_env_content("INVALID LINE WITHOUT EQUALS").is_err());
        assert!(env.parse_env_content("=value").is_err());
    }

    #[test]
    fn test_blank_and_unparsable_values() {
        let env = EnvManager::from_vars([(PGHOST, "  "), (PGPORT, "fifty")]);
        assert_eq!(env.get(PGHOST), None);
        assert!(matches!(
            env.parse::<u16>("port", PGPORT),
            Err(CliError::InvalidValue { name: "port", .. })
        ));
    }
}
