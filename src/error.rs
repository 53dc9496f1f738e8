//! 错误类型
//!
//! 容器级错误（解码、解密）对整个加载过程是致命的；
//! 链级错误（派生、编码）按链记录，不影响同批次的其他链。

use serde::Serialize;
use thiserror::Error;

/// 容器 / 记录解码与解密错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("malformed vault container: {0}")]
    MalformedContainer(String),

    #[error("malformed vault record: {0}")]
    MalformedRecord(String),

    #[error("vault is encrypted, a password is required")]
    PasswordRequired,

    #[error("ciphertext too short: {len} bytes (minimum {min})")]
    MalformedCiphertext { len: usize, min: usize },

    #[error("authentication failed: wrong password or corrupted vault")]
    AuthenticationFailed,

    #[error("encryption failed: {0}")]
    Encryption(String),
}

/// BIP32 公钥派生错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("hardened index {index:#x} at position {position} cannot be derived from a public key")]
    HardenedDerivationUnsupported { index: u32, position: usize },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid child key at index {index}")]
    InvalidChildKey { index: u32 },

    #[error("invalid derivation path: {0}")]
    InvalidPath(String),
}

/// 曲线后端错误（由派生器映射为 DerivationError）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("invalid point: {0}")]
    InvalidPoint(String),

    #[error("tweak is not a valid scalar")]
    TweakOutOfRange,

    #[error("result is the point at infinity")]
    PointAtInfinity,
}

/// 地址编码错误（按链记录）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("missing key material for {chain}: {missing}")]
    MissingKeyMaterial {
        chain: String,
        missing: &'static str,
    },

    #[error("encoding failure: {0}")]
    EncodingFailure(String),

    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

/// 链注册表校验错误（启动时检查）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid chain registry: {}", .0.join("; "))]
    InvalidRegistry(Vec<String>),
}

impl VaultError {
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::MalformedContainer(_) => "malformed_container",
            VaultError::MalformedRecord(_) => "malformed_record",
            VaultError::PasswordRequired => "password_required",
            VaultError::MalformedCiphertext { .. } => "malformed_ciphertext",
            VaultError::AuthenticationFailed => "authentication_failed",
            VaultError::Encryption(_) => "encryption_failed",
        }
    }

    /// 调用方是否可以通过重新输入密码恢复
    pub fn is_password_related(&self) -> bool {
        matches!(
            self,
            VaultError::PasswordRequired | VaultError::AuthenticationFailed
        )
    }
}

impl DerivationError {
    pub fn code(&self) -> &'static str {
        match self {
            DerivationError::HardenedDerivationUnsupported { .. } => {
                "hardened_derivation_unsupported"
            }
            DerivationError::InvalidPublicKey(_) => "invalid_public_key",
            DerivationError::InvalidChildKey { .. } => "invalid_child_key",
            DerivationError::InvalidPath(_) => "invalid_path",
        }
    }
}

impl AddressError {
    pub fn code(&self) -> &'static str {
        match self {
            AddressError::UnsupportedChain(_) => "unsupported_chain",
            AddressError::MissingKeyMaterial { .. } => "missing_key_material",
            AddressError::EncodingFailure(_) => "encoding_failure",
            AddressError::Derivation(e) => e.code(),
        }
    }

    pub(crate) fn encoding(msg: impl Into<String>) -> Self {
        AddressError::EncodingFailure(msg.into())
    }
}

/// 输出用错误体（JSON）
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: &'a str,
    pub message: String,
}

impl<'a> From<&'a AddressError> for ErrorBody<'a> {
    fn from(err: &'a AddressError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}
