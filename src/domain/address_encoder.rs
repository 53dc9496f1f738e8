//! 地址编码器
//!
//! 把（已派生的）公钥按链的地址策略编码成字符串。
//! 每种策略都是纯函数，`AddressEncoder` 只负责分派与未压缩公钥的获取。

use std::fmt;
use std::sync::Arc;

use bech32::{Bech32, Hrp};
use bitcoin::hashes::{hash160 as bitcoin_hash160, Hash};
use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use sha3::{Digest, Keccak256};

use crate::domain::chain_config::{AddressStrategy, ChainProfile, SignatureAlgorithm};
use crate::error::AddressError;
use crate::infrastructure::curve::CurveBackend;
use crate::utils::cashaddr;

/// 编码地址所需的公钥材料
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMaterial {
    /// 已沿链路径派生的 secp256k1 压缩公钥
    Ecdsa { public_key: [u8; 33] },
    /// ed25519 根公钥；Cardano 额外需要链码
    Eddsa {
        public_key: [u8; 32],
        chain_code: Option<[u8; 32]>,
    },
}

/// 地址编码器
#[derive(Clone)]
pub struct AddressEncoder {
    curve: Arc<dyn CurveBackend>,
}

impl AddressEncoder {
    pub fn new(curve: Arc<dyn CurveBackend>) -> Self {
        Self { curve }
    }

    /// 按链配置编码地址
    pub fn encode_address(
        &self,
        key: &KeyMaterial,
        profile: &ChainProfile,
    ) -> Result<String, AddressError> {
        match (profile.address_strategy, key) {
            // ━━━━ secp256k1 ━━━━
            (AddressStrategy::SegwitV0 { hrp }, KeyMaterial::Ecdsa { public_key }) => {
                encode_segwit_v0(public_key, hrp)
            }
            (AddressStrategy::Base58P2pkh { version }, KeyMaterial::Ecdsa { public_key }) => {
                Ok(encode_base58_p2pkh(public_key, version))
            }
            (AddressStrategy::CashAddr { prefix }, KeyMaterial::Ecdsa { public_key }) => {
                cashaddr::encode(prefix, cashaddr::KIND_P2PKH, &hash160(public_key))
            }
            (AddressStrategy::CosmosBech32 { hrp }, KeyMaterial::Ecdsa { public_key }) => {
                encode_cosmos_bech32(public_key, hrp)
            }
            (AddressStrategy::Evm, KeyMaterial::Ecdsa { public_key }) => {
                Ok(encode_evm(&self.uncompressed(public_key)?))
            }
            (AddressStrategy::TronBase58 { version }, KeyMaterial::Ecdsa { public_key }) => {
                Ok(encode_tron(&self.uncompressed(public_key)?, version))
            }
            (AddressStrategy::RippleBase58 { version }, KeyMaterial::Ecdsa { public_key }) => {
                Ok(encode_ripple(public_key, version))
            }

            // ━━━━ ed25519 ━━━━
            (strategy, KeyMaterial::Eddsa { public_key, chain_code })
                if strategy.algorithm() == SignatureAlgorithm::Eddsa =>
            {
                ensure_ed25519_point(public_key)?;
                match strategy {
                    AddressStrategy::SolanaBase58 => Ok(encode_solana(public_key)),
                    AddressStrategy::SuiBlake2b => encode_sui(public_key),
                    AddressStrategy::Ss58 { prefix } => encode_ss58(public_key, prefix),
                    AddressStrategy::CardanoEnterprise { header, hrp } => {
                        let chain_code =
                            chain_code.ok_or_else(|| AddressError::MissingKeyMaterial {
                                chain: profile.chain.to_string(),
                                missing: "hex_chain_code",
                            })?;
                        encode_cardano_enterprise(public_key, &chain_code, header, hrp)
                    }
                    other => Err(key_mismatch(other, key)),
                }
            }

            (strategy, key) => Err(key_mismatch(strategy, key)),
        }
    }

    fn uncompressed(&self, public_key: &[u8; 33]) -> Result<[u8; 65], AddressError> {
        self.curve
            .decompress(public_key)
            .map_err(|e| AddressError::encoding(e.to_string()))
    }
}

impl fmt::Debug for AddressEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressEncoder")
            .field("curve", &self.curve.name())
            .finish()
    }
}

fn key_mismatch(strategy: AddressStrategy, key: &KeyMaterial) -> AddressError {
    let got = match key {
        KeyMaterial::Ecdsa { .. } => "ecdsa",
        KeyMaterial::Eddsa { .. } => "eddsa",
    };
    AddressError::encoding(format!(
        "strategy {} cannot encode a {} key",
        strategy.tag(),
        got
    ))
}

/// ed25519 公钥必须是曲线上的合法点
fn ensure_ed25519_point(public_key: &[u8; 32]) -> Result<(), AddressError> {
    ed25519_dalek::VerifyingKey::from_bytes(public_key)
        .map(|_| ())
        .map_err(|e| AddressError::encoding(format!("invalid ed25519 public key: {}", e)))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 哈希工具
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    bitcoin_hash160::Hash::hash(data).to_byte_array()
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// 变长 blake2b（输出 1..=64 字节）
pub fn blake2b(parts: &[&[u8]], out_len: usize) -> Result<Vec<u8>, AddressError> {
    let mut hasher = Blake2bVar::new(out_len)
        .map_err(|_| AddressError::encoding(format!("blake2b: invalid output length {}", out_len)))?;
    for part in parts {
        hasher.update(part);
    }
    let mut out = vec![0u8; out_len];
    hasher
        .finalize_variable(&mut out)
        .map_err(|_| AddressError::encoding("blake2b: output buffer mismatch"))?;
    Ok(out)
}

fn parse_hrp(hrp: &str) -> Result<Hrp, AddressError> {
    Hrp::parse(hrp).map_err(|e| AddressError::encoding(format!("invalid hrp {:?}: {}", hrp, e)))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UTXO / Cosmos
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// P2WPKH (bech32 见证 v0)
pub fn encode_segwit_v0(public_key: &[u8; 33], hrp: &str) -> Result<String, AddressError> {
    bech32::segwit::encode_v0(parse_hrp(hrp)?, &hash160(public_key))
        .map_err(|e| AddressError::encoding(format!("segwit: {}", e)))
}

/// P2PKH (Base58Check)
pub fn encode_base58_p2pkh(public_key: &[u8; 33], version: &[u8]) -> String {
    let mut payload = Vec::with_capacity(version.len() + 20);
    payload.extend_from_slice(version);
    payload.extend_from_slice(&hash160(public_key));
    bs58::encode(payload).with_check().into_string()
}

/// Cosmos SDK 账户地址 (bech32)
pub fn encode_cosmos_bech32(public_key: &[u8; 33], hrp: &str) -> Result<String, AddressError> {
    bech32::encode::<Bech32>(parse_hrp(hrp)?, &hash160(public_key))
        .map_err(|e| AddressError::encoding(format!("bech32: {}", e)))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EVM / Tron / Ripple
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// keccak256(X || Y) 的后 20 字节
fn evm_account(uncompressed: &[u8; 65]) -> [u8; 20] {
    let hash = keccak256(&uncompressed[1..]);
    let mut account = [0u8; 20];
    account.copy_from_slice(&hash[12..]);
    account
}

/// EVM 地址（EIP-55 大小写校验）
pub fn encode_evm(uncompressed: &[u8; 65]) -> String {
    to_eip55(&evm_account(uncompressed))
}

/// EIP-55 校验和编码
/// https://eips.ethereum.org/EIPS/eip-55
pub fn to_eip55(account: &[u8; 20]) -> String {
    let lower = hex::encode(account);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Tron 地址：version || EVM 账户 → Base58Check
pub fn encode_tron(uncompressed: &[u8; 65], version: u8) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(version);
    payload.extend_from_slice(&evm_account(uncompressed));
    bs58::encode(payload).with_check().into_string()
}

/// Ripple 经典地址（Ripple 字母表的 Base58Check）
pub fn encode_ripple(public_key: &[u8; 33], version: u8) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(version);
    payload.extend_from_slice(&hash160(public_key));
    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check()
        .into_string()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ed25519 系列
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn encode_solana(public_key: &[u8; 32]) -> String {
    bs58::encode(public_key).into_string()
}

/// Sui：blake2b-256(flag 0x00 || 公钥)
pub fn encode_sui(public_key: &[u8; 32]) -> Result<String, AddressError> {
    let digest = blake2b(&[&[0x00], public_key], 32)?;
    Ok(format!("0x{}", hex::encode(digest)))
}

/// SS58 前缀编码（单字节 < 64，否则两字节）
pub(crate) fn ss58_prefix_bytes(prefix: u16) -> Result<Vec<u8>, AddressError> {
    match prefix {
        0..=63 => Ok(vec![prefix as u8]),
        64..=16383 => {
            let first = (((prefix & 0x00fc) >> 2) as u8) | 0x40;
            let second = ((prefix >> 8) as u8) | (((prefix & 0x0003) << 6) as u8);
            Ok(vec![first, second])
        }
        _ => Err(AddressError::encoding(format!(
            "ss58: prefix {} out of range",
            prefix
        ))),
    }
}

/// SS58（Substrate）：prefix || key || blake2b-512("SS58PRE" || prefix || key)[..2]
pub fn encode_ss58(public_key: &[u8; 32], prefix: u16) -> Result<String, AddressError> {
    let mut payload = ss58_prefix_bytes(prefix)?;
    payload.extend_from_slice(public_key);
    let checksum = blake2b(&[b"SS58PRE", &payload], 64)?;
    payload.extend_from_slice(&checksum[..2]);
    Ok(bs58::encode(payload).into_string())
}

/// Cardano 扩展公钥：pk || pk || cc || cc（128 字节）
///
/// 支付凭证只取前 32 字节，链码不影响地址。
pub fn cardano_extended_key(public_key: &[u8; 32], chain_code: &[u8; 32]) -> [u8; 128] {
    let mut extended = [0u8; 128];
    extended[..32].copy_from_slice(public_key);
    extended[32..64].copy_from_slice(public_key);
    extended[64..96].copy_from_slice(chain_code);
    extended[96..].copy_from_slice(chain_code);
    extended
}

/// Cardano enterprise 地址：header || blake2b-224(支付公钥) → bech32
pub fn encode_cardano_enterprise(
    public_key: &[u8; 32],
    chain_code: &[u8; 32],
    header: u8,
    hrp: &str,
) -> Result<String, AddressError> {
    let extended = cardano_extended_key(public_key, chain_code);
    let key_hash = blake2b(&[&extended[..32]], 28)?;

    let mut payload = Vec::with_capacity(29);
    payload.push(header);
    payload.extend_from_slice(&key_hash);
    bech32::encode::<Bech32>(parse_hrp(hrp)?, &payload)
        .map_err(|e| AddressError::encoding(format!("bech32: {}", e)))
}
