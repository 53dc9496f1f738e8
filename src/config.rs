//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::chain_config::ChainId;
use crate::infrastructure::curve::CurveBackendKind;
use crate::infrastructure::encryption::KeyDerivation;
use crate::infrastructure::password::Password;
use crate::infrastructure::pbkdf2::{DEFAULT_ITERATIONS, MIN_ITERATIONS};
use crate::utils::chain_normalizer;

/// 应用配置结构体
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub derivation: DerivationConfig,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// 金库文件配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub path: Option<PathBuf>,
    pub password: Option<Password>,
    /// "sha256"（兼容现有 .vult 文件）或 "pbkdf2"
    pub kdf: String,
    pub pbkdf2_iterations: u32,
}

/// 派生配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// 为空表示全部链
    pub chains: Vec<String>,
    pub parallel: bool,
    /// "k256" 或 "secp256k1"
    pub backend: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: std::env::var("VAULT_PATH").ok().map(PathBuf::from),
            password: std::env::var("VAULT_PASSWORD").ok().map(Password::new),
            kdf: std::env::var("VAULT_KDF").unwrap_or_else(|_| "sha256".into()),
            pbkdf2_iterations: std::env::var("VAULT_PBKDF2_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ITERATIONS),
        }
    }
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            chains: std::env::var("VAULT_CHAINS")
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            parallel: std::env::var("DERIVE_PARALLEL")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            backend: std::env::var("CURVE_BACKEND").unwrap_or_else(|_| "k256".into()),
        }
    }
}

impl VaultConfig {
    /// 容器密码的密钥派生方式
    pub fn key_derivation(&self) -> Result<KeyDerivation> {
        match self.kdf.to_lowercase().as_str() {
            "sha256" => Ok(KeyDerivation::LegacySha256),
            "pbkdf2" => Ok(KeyDerivation::Pbkdf2Sha256 {
                iterations: self.pbkdf2_iterations,
            }),
            other => anyhow::bail!("VAULT_KDF must be 'sha256' or 'pbkdf2', got '{}'", other),
        }
    }
}

impl DerivationConfig {
    pub fn backend_kind(&self) -> Result<CurveBackendKind> {
        self.backend.parse().context("Invalid CURVE_BACKEND")
    }

    /// 解析链列表（为空时返回全部链）
    pub fn chain_ids(&self) -> Result<Vec<ChainId>> {
        if self.chains.is_empty() {
            return Ok(ChainId::ALL.to_vec());
        }
        chain_normalizer::parse_chain_list(&self.chains.join(","))
            .context("Invalid VAULT_CHAINS")
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            logging: LoggingConfig::default(),
            vault: VaultConfig::default(),
            derivation: DerivationConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    ///
    /// 文件中缺省的字段回落到环境变量 / 默认值。
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().exists() => Self::from_file(path),
            Some(path) => anyhow::bail!("Config file not found: {:?}", path.as_ref()),
            None => Self::from_env(),
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if let KeyDerivation::Pbkdf2Sha256 { iterations } = self.vault.key_derivation()? {
            if iterations < MIN_ITERATIONS {
                anyhow::bail!(
                    "VAULT_PBKDF2_ITERATIONS must be at least {} (got {})",
                    MIN_ITERATIONS,
                    iterations
                );
            }
        }

        self.derivation.backend_kind()?;
        self.derivation.chain_ids()?;

        Ok(())
    }
}
