use anyhow::{Context, Result, bail};
use remise_core::Iban;
use remise_ingest::Assembler;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_remise_home, remise_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub export: ExportSection,
    pub parsing: ParsingSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Output file name without extension or timestamp
    pub filename_prefix: String,
    /// Append `_YYYYmmdd_HHMMSS` to the output file name
    pub timestamp: bool,
    /// Single ASCII character separating cells
    pub delimiter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingSection {
    /// Settlement account used when a header has none
    pub fallback_account: String,
    pub default_batch_type: String,
    pub default_status: String,
    /// Stripped from file names in reports
    pub display_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            filename_prefix: "ops".to_string(),
            timestamp: true,
            delimiter: ";".to_string(),
        }
    }
}

impl Default for ParsingSection {
    fn default() -> Self {
        Self {
            fallback_account: remise_ingest::assemble::FALLBACK_ACCOUNT.to_string(),
            default_batch_type: remise_ingest::assemble::DEFAULT_BATCH_TYPE.to_string(),
            default_status: remise_ingest::assemble::DEFAULT_STATUS.to_string(),
            display_prefix: remise_core::DISPLAY_PREFIX.to_string(),
        }
    }
}

pub const DEFAULT_LOG_LEVEL: &str = "warn";

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ExportSection {
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => bail!(
                "export.delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ),
        }
    }
}

impl ParsingSection {
    pub fn assembler(&self) -> Result<Assembler> {
        let fallback_account = self
            .fallback_account
            .parse::<Iban>()
            .with_context(|| format!("parsing.fallback_account {:?}", self.fallback_account))?;
        Ok(Assembler {
            fallback_account,
            default_batch_type: self.default_batch_type.clone(),
            default_status: self.default_status.clone(),
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(remise_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

/// Logging level from a config that may have failed to load
pub fn log_level_or_default(cfg: &Result<Config>) -> &str {
    cfg.as_ref()
        .map_or(DEFAULT_LOG_LEVEL, |c| c.logging.level.as_str())
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = ensure_remise_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
