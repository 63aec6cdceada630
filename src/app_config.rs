//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use mirror_core::{ContentFilter, TranslationSelection};

use crate::cli::{MAX_DELAY_SECS, RepoSlug, Target};

/// Flat `key = value` file configuration for mirror defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Default mirror root for the local target.
    pub output_dir: Option<PathBuf>,
    /// Default concurrency (same range as CLI).
    pub concurrency: Option<u8>,
    /// Default inter-request delay in seconds.
    pub delay_secs: Option<f64>,
    /// Default API attempts.
    pub max_attempts: Option<u8>,
    /// Default content filter.
    pub files: Option<ContentFilter>,
    /// Default translation selection.
    pub translations: Option<TranslationSelection>,
    /// Default target.
    pub target: Option<Target>,
    /// Default repository for the github target.
    pub repo: Option<RepoSlug>,
    /// Default branch for the github target.
    pub branch: Option<String>,
    /// Recitation API base override.
    pub api_base: Option<String>,
    /// Audio host override.
    pub audio_host: Option<String>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=100).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=100");
        }

        if let Some(delay) = self.delay_secs
            && !(0.0..=MAX_DELAY_SECS).contains(&delay)
        {
            bail!("Invalid config value for `delay_secs`: {delay}. Expected range: 0..=60");
        }

        if let Some(attempts) = self.max_attempts
            && !(1..=10).contains(&attempts)
        {
            bail!("Invalid config value for `max_attempts`: {attempts}. Expected range: 1..=10");
        }

        if let Some(branch) = &self.branch
            && branch.trim().is_empty()
        {
            bail!("Invalid config value for `branch`: must not be empty");
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/recitation-mirror/config.toml`
/// 2. `$HOME/.config/recitation-mirror/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("recitation-mirror")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("recitation-mirror")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "concurrency" => {
                cfg.concurrency = Some(parse_integer_u8(value).with_context(invalid)?);
            }
            "delay_secs" => {
                cfg.delay_secs = Some(parse_float(value).with_context(invalid)?);
            }
            "max_attempts" => {
                cfg.max_attempts = Some(parse_integer_u8(value).with_context(invalid)?);
            }
            "files" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let filter = parsed
                    .parse::<ContentFilter>()
                    .map_err(|e| anyhow::anyhow!(e))
                    .with_context(invalid)?;
                cfg.files = Some(filter);
            }
            "translations" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let selection = parsed
                    .parse::<TranslationSelection>()
                    .map_err(|e| anyhow::anyhow!(e))
                    .with_context(invalid)?;
                cfg.translations = Some(selection);
            }
            "target" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let target = Target::from_str(&parsed, true)
                    .map_err(|e| anyhow::anyhow!(e))
                    .with_context(invalid)?;
                cfg.target = Some(target);
            }
            "repo" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let repo = parsed
                    .parse::<RepoSlug>()
                    .map_err(|e| anyhow::anyhow!(e))
                    .with_context(invalid)?;
                cfg.repo = Some(repo);
            }
            "branch" => {
                cfg.branch = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "api_base" => {
                cfg.api_base = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "audio_host" => {
                cfg.audio_host = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_float(raw_value: &str) -> Result<f64> {
    let value = raw_value.trim().parse::<f64>()?;
    if !value.is_finite() {
        bail!("Expected a finite number");
    }
    Ok(value)
}
