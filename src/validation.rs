//! Input validation for names and identifiers supplied on the command line
//! or read back from the state document.

use anyhow::{bail, Context, Result};
use regex::Regex;

/// Maximum allowed length for task IDs, role names and project names.
pub const MAX_ID_LENGTH: usize = 64;

/// Maximum allowed length for descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Reserved names that cannot be used as IDs (case-insensitive).
const RESERVED_NAMES: &[&str] = &[".", "..", "con", "prn", "aux", "nul"];

const PROJECT_NAME_PATTERN: &str = r"^[a-z0-9]+(-[a-z0-9]+)*$";

/// Validates a task ID or agent role name.
///
/// ```
/// use weft::validation::validate_id;
///
/// assert!(validate_id("010").is_ok());
/// assert!(validate_id("api_v2").is_ok());
/// assert!(validate_id("../etc/passwd").is_err());
/// ```
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        bail!("ID cannot be empty");
    }

    if id.len() > MAX_ID_LENGTH {
        bail!(
            "ID too long: {} characters (max {})",
            id.len(),
            MAX_ID_LENGTH
        );
    }

    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_chars {
        bail!("ID '{id}' contains invalid characters. Use only alphanumeric characters, dashes (-), and underscores (_)");
    }

    if RESERVED_NAMES.contains(&id.to_lowercase().as_str()) {
        bail!("ID '{id}' uses a reserved name");
    }

    Ok(())
}

/// Project names are kebab-case: lowercase words joined by single dashes.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.len() > MAX_ID_LENGTH {
        bail!(
            "project name too long: {} characters (max {})",
            name.len(),
            MAX_ID_LENGTH
        );
    }
    let kebab = Regex::new(PROJECT_NAME_PATTERN).context("Invalid project name pattern")?;
    if !kebab.is_match(name) {
        bail!("project name '{name}' must be kebab-case (e.g. 'add-user-auth')");
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<()> {
    if description.len() > MAX_DESCRIPTION_LENGTH {
        bail!(
            "Description too long: {} characters (max {})",
            description.len(),
            MAX_DESCRIPTION_LENGTH
        );
    }

    Ok(())
}

/// Clap value parser for ID arguments.
pub fn clap_id_validator(s: &str) -> Result<String, String> {
    validate_id(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

pub fn clap_project_name_validator(s: &str) -> Result<String, String> {
    validate_project_name(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

pub fn clap_description_validator(s: &str) -> Result<String, String> {
    validate_description(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

/// Clap value parser for `key=value` pairs.
pub fn clap_key_value_parser(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id_valid() {
        assert!(validate_id("010").is_ok());
        assert!(validate_id("planner").is_ok());
        assert!(validate_id("task_2024-a").is_ok());
    }

    #[test]
    fn test_validate_id_rejects() {
        assert!(validate_id("")
            .unwrap_err()
            .to_string()
            .contains("cannot be empty"));
        assert!(validate_id(&"a".repeat(MAX_ID_LENGTH + 1)).is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("CON").is_err());
    }

    #[test]
    fn test_project_name_must_be_kebab_case() {
        assert!(validate_project_name("add-user-auth").is_ok());
        assert!(validate_project_name("v2").is_ok());
        assert!(validate_project_name("Add-Auth").is_err());
        assert!(validate_project_name("add--auth").is_err());
        assert!(validate_project_name("-auth").is_err());
        assert!(validate_project_name("add_auth").is_err());
        assert!(validate_project_name("").is_err());
    }

    #[test]
    fn test_description_length() {
        assert!(validate_description("short").is_ok());
        assert!(validate_description(&"x".repeat(MAX_DESCRIPTION_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_key_value_parser() {
        assert_eq!(
            clap_key_value_parser("assessment=pass").unwrap(),
            ("assessment".to_string(), "pass".to_string())
        );
        assert_eq!(
            clap_key_value_parser("url=https://x?a=b").unwrap().1,
            "https://x?a=b"
        );
        assert!(clap_key_value_parser("novalue").is_err());
        assert!(clap_key_value_parser("=v").is_err());
    }
}
