//! 多链配置模块
//!
//! 定义所有支持的区块链、签名算法、派生路径与地址编码策略。
//! 注册表在启动时构建并校验一次，此后只读。

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};

use crate::domain::derivation::{DerivationPath, HARDENED_BIT};
use crate::error::{AddressError, RegistryError};

/// 链标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChainId {
    Bitcoin,
    Litecoin,
    Dogecoin,
    BitcoinCash,
    Dash,
    Zcash,
    Ethereum,
    BscChain,
    Avalanche,
    Polygon,
    Optimism,
    Arbitrum,
    Base,
    ThorChain,
    MayaChain,
    Cosmos,
    Osmosis,
    Dydx,
    Kujira,
    Terra,
    Noble,
    Tron,
    Ripple,
    Solana,
    Sui,
    Polkadot,
    Cardano,
}

impl ChainId {
    /// 所有支持的链（注册表顺序）
    pub const ALL: [ChainId; 27] = [
        ChainId::Bitcoin,
        ChainId::Litecoin,
        ChainId::Dogecoin,
        ChainId::BitcoinCash,
        ChainId::Dash,
        ChainId::Zcash,
        ChainId::Ethereum,
        ChainId::BscChain,
        ChainId::Avalanche,
        ChainId::Polygon,
        ChainId::Optimism,
        ChainId::Arbitrum,
        ChainId::Base,
        ChainId::ThorChain,
        ChainId::MayaChain,
        ChainId::Cosmos,
        ChainId::Osmosis,
        ChainId::Dydx,
        ChainId::Kujira,
        ChainId::Terra,
        ChainId::Noble,
        ChainId::Tron,
        ChainId::Ripple,
        ChainId::Solana,
        ChainId::Sui,
        ChainId::Polkadot,
        ChainId::Cardano,
    ];

    /// EVM 系列：共享 coin type 60，地址完全相同
    pub const EVM: [ChainId; 7] = [
        ChainId::Ethereum,
        ChainId::BscChain,
        ChainId::Avalanche,
        ChainId::Polygon,
        ChainId::Optimism,
        ChainId::Arbitrum,
        ChainId::Base,
    ];

    /// 短标识（命令行与输出使用）
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Bitcoin => "btc",
            ChainId::Litecoin => "ltc",
            ChainId::Dogecoin => "doge",
            ChainId::BitcoinCash => "bch",
            ChainId::Dash => "dash",
            ChainId::Zcash => "zec",
            ChainId::Ethereum => "eth",
            ChainId::BscChain => "bsc",
            ChainId::Avalanche => "avax",
            ChainId::Polygon => "matic",
            ChainId::Optimism => "op",
            ChainId::Arbitrum => "arb",
            ChainId::Base => "base",
            ChainId::ThorChain => "thor",
            ChainId::MayaChain => "maya",
            ChainId::Cosmos => "atom",
            ChainId::Osmosis => "osmo",
            ChainId::Dydx => "dydx",
            ChainId::Kujira => "kuji",
            ChainId::Terra => "luna",
            ChainId::Noble => "noble",
            ChainId::Tron => "trx",
            ChainId::Ripple => "xrp",
            ChainId::Solana => "sol",
            ChainId::Sui => "sui",
            ChainId::Polkadot => "dot",
            ChainId::Cardano => "ada",
        }
    }

    /// 链名称
    pub fn name(&self) -> &'static str {
        match self {
            ChainId::Bitcoin => "Bitcoin",
            ChainId::Litecoin => "Litecoin",
            ChainId::Dogecoin => "Dogecoin",
            ChainId::BitcoinCash => "Bitcoin Cash",
            ChainId::Dash => "Dash",
            ChainId::Zcash => "Zcash",
            ChainId::Ethereum => "Ethereum",
            ChainId::BscChain => "BNB Smart Chain",
            ChainId::Avalanche => "Avalanche C-Chain",
            ChainId::Polygon => "Polygon",
            ChainId::Optimism => "Optimism",
            ChainId::Arbitrum => "Arbitrum One",
            ChainId::Base => "Base",
            ChainId::ThorChain => "THORChain",
            ChainId::MayaChain => "MayaChain",
            ChainId::Cosmos => "Cosmos Hub",
            ChainId::Osmosis => "Osmosis",
            ChainId::Dydx => "dYdX",
            ChainId::Kujira => "Kujira",
            ChainId::Terra => "Terra",
            ChainId::Noble => "Noble",
            ChainId::Tron => "Tron",
            ChainId::Ripple => "Ripple",
            ChainId::Solana => "Solana",
            ChainId::Sui => "Sui",
            ChainId::Polkadot => "Polkadot",
            ChainId::Cardano => "Cardano",
        }
    }

    pub fn is_evm(&self) -> bool {
        Self::EVM.contains(self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::utils::chain_normalizer::normalize_chain_identifier(s)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 签名算法（决定使用哪把根公钥）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    /// ECDSA / secp256k1，需要 BIP32 非强化派生
    Ecdsa,
    /// EdDSA / ed25519，直接使用根公钥
    Eddsa,
}

impl SignatureAlgorithm {
    pub fn curve(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Ecdsa => "secp256k1",
            SignatureAlgorithm::Eddsa => "ed25519",
        }
    }
}

/// 地址编码策略
///
/// 每个变体只携带自身需要的参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddressStrategy {
    /// hash160 → bech32 见证 v0 (P2WPKH)
    SegwitV0 { hrp: &'static str },
    /// hash160 → Base58Check (P2PKH)，版本字节可为多字节（Zcash）
    Base58P2pkh { version: &'static [u8] },
    /// hash160 → CashAddr
    CashAddr { prefix: &'static str },
    /// hash160 → 普通 bech32（Cosmos SDK 系列，包括 Maya）
    CosmosBech32 { hrp: &'static str },
    /// keccak256(未压缩公钥) 后 20 字节，EIP-55 大小写校验
    Evm,
    /// keccak256(未压缩公钥) 后 20 字节 → Base58Check
    TronBase58 { version: u8 },
    /// hash160 → Base58Check（Ripple 字母表）
    RippleBase58 { version: u8 },
    /// ed25519 公钥直接 Base58
    SolanaBase58,
    /// blake2b-256(0x00 || 公钥) → 0x 十六进制
    SuiBlake2b,
    /// SS58（Substrate）
    Ss58 { prefix: u16 },
    /// Cardano enterprise 地址：扩展公钥 → blake2b-224 → bech32
    CardanoEnterprise { header: u8, hrp: &'static str },
}

impl AddressStrategy {
    /// 策略要求的签名算法
    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            AddressStrategy::SolanaBase58
            | AddressStrategy::SuiBlake2b
            | AddressStrategy::Ss58 { .. }
            | AddressStrategy::CardanoEnterprise { .. } => SignatureAlgorithm::Eddsa,
            _ => SignatureAlgorithm::Ecdsa,
        }
    }

    /// 策略标签（日志与表格输出）
    pub fn tag(&self) -> &'static str {
        match self {
            AddressStrategy::SegwitV0 { .. } => "segwit-v0",
            AddressStrategy::Base58P2pkh { .. } => "base58-p2pkh",
            AddressStrategy::CashAddr { .. } => "cashaddr",
            AddressStrategy::CosmosBech32 { .. } => "cosmos-bech32",
            AddressStrategy::Evm => "evm",
            AddressStrategy::TronBase58 { .. } => "tron-base58",
            AddressStrategy::RippleBase58 { .. } => "ripple-base58",
            AddressStrategy::SolanaBase58 => "solana-base58",
            AddressStrategy::SuiBlake2b => "sui-blake2b",
            AddressStrategy::Ss58 { .. } => "ss58",
            AddressStrategy::CardanoEnterprise { .. } => "cardano-enterprise",
        }
    }
}

/// 链配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainProfile {
    pub chain: ChainId,
    pub algorithm: SignatureAlgorithm,
    /// BIP44 coin type
    pub coin_type: u32,
    /// 习惯写法，如 m/84'/0'/0'/0/0（仅作元数据）
    pub path_notation: &'static str,
    /// 实际使用的非强化索引
    #[serde(serialize_with = "serialize_path")]
    pub derivation_path: DerivationPath,
    pub address_strategy: AddressStrategy,
}

fn serialize_path<S: Serializer>(path: &DerivationPath, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(path.indices())
}

/// 链配置注册表
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    profiles: HashMap<ChainId, ChainProfile>,
    /// 构建阶段发现的问题，由 validate() 统一报告
    build_errors: Vec<String>,
}

static DEFAULT_REGISTRY: Lazy<Arc<ChainRegistry>> = Lazy::new(|| Arc::new(ChainRegistry::new()));

impl ChainRegistry {
    /// 创建预配置的注册表
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_default_chains();
        registry
    }

    /// 空注册表
    pub fn empty() -> Self {
        Self::default()
    }

    /// 进程内共享的默认注册表
    pub fn shared() -> Arc<ChainRegistry> {
        Arc::clone(&DEFAULT_REGISTRY)
    }

    /// 注册默认支持的链
    fn register_default_chains(&mut self) {
        use AddressStrategy::*;
        use SignatureAlgorithm::{Ecdsa, Eddsa};

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // UTXO 系列
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

        self.register_chain(ChainId::Bitcoin, Ecdsa, 0, "m/84'/0'/0'/0/0", SegwitV0 { hrp: "bc" });
        self.register_chain(ChainId::Litecoin, Ecdsa, 2, "m/84'/2'/0'/0/0", SegwitV0 { hrp: "ltc" });
        self.register_chain(
            ChainId::Dogecoin,
            Ecdsa,
            3,
            "m/44'/3'/0'/0/0",
            Base58P2pkh { version: &[0x1e] },
        );
        self.register_chain(
            ChainId::BitcoinCash,
            Ecdsa,
            145,
            "m/44'/145'/0'/0/0",
            CashAddr { prefix: "bitcoincash" },
        );
        self.register_chain(
            ChainId::Dash,
            Ecdsa,
            5,
            "m/44'/5'/0'/0/0",
            Base58P2pkh { version: &[0x4c] },
        );
        // Zcash 透明地址 (t1...)，两字节版本前缀
        self.register_chain(
            ChainId::Zcash,
            Ecdsa,
            133,
            "m/44'/133'/0'/0/0",
            Base58P2pkh { version: &[0x1c, 0xb8] },
        );

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // EVM 系列 (共享 coin type 60)
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

        for chain in ChainId::EVM {
            self.register_chain(chain, Ecdsa, 60, "m/44'/60'/0'/0/0", Evm);
        }

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // Cosmos SDK 系列
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

        self.register_chain(
            ChainId::ThorChain,
            Ecdsa,
            931,
            "m/44'/931'/0'/0/0",
            CosmosBech32 { hrp: "thor" },
        );
        // Maya 复用 THORChain 的 coin type 与路径，只换前缀
        self.register_chain(
            ChainId::MayaChain,
            Ecdsa,
            931,
            "m/44'/931'/0'/0/0",
            CosmosBech32 { hrp: "maya" },
        );
        self.register_chain(
            ChainId::Cosmos,
            Ecdsa,
            118,
            "m/44'/118'/0'/0/0",
            CosmosBech32 { hrp: "cosmos" },
        );
        self.register_chain(
            ChainId::Osmosis,
            Ecdsa,
            118,
            "m/44'/118'/0'/0/0",
            CosmosBech32 { hrp: "osmo" },
        );
        self.register_chain(
            ChainId::Dydx,
            Ecdsa,
            118,
            "m/44'/118'/0'/0/0",
            CosmosBech32 { hrp: "dydx" },
        );
        self.register_chain(
            ChainId::Kujira,
            Ecdsa,
            118,
            "m/44'/118'/0'/0/0",
            CosmosBech32 { hrp: "kujira" },
        );
        self.register_chain(
            ChainId::Terra,
            Ecdsa,
            330,
            "m/44'/330'/0'/0/0",
            CosmosBech32 { hrp: "terra" },
        );
        self.register_chain(
            ChainId::Noble,
            Ecdsa,
            118,
            "m/44'/118'/0'/0/0",
            CosmosBech32 { hrp: "noble" },
        );

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // 其他 secp256k1 链
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

        self.register_chain(
            ChainId::Tron,
            Ecdsa,
            195,
            "m/44'/195'/0'/0/0",
            TronBase58 { version: 0x41 },
        );
        self.register_chain(
            ChainId::Ripple,
            Ecdsa,
            144,
            "m/44'/144'/0'/0/0",
            RippleBase58 { version: 0x00 },
        );

        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
        // Ed25519 系列 (不做 HD 派生，路径仅作元数据)
        // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

        self.register_chain(ChainId::Solana, Eddsa, 501, "m/44'/501'/0'/0'", SolanaBase58);
        self.register_chain(ChainId::Sui, Eddsa, 784, "m/44'/784'/0'/0'/0'", SuiBlake2b);
        self.register_chain(
            ChainId::Polkadot,
            Eddsa,
            354,
            "m/44'/354'/0'/0'/0'",
            Ss58 { prefix: 0 },
        );
        self.register_chain(
            ChainId::Cardano,
            Eddsa,
            1815,
            "m/44'/1815'/0'/0/0",
            CardanoEnterprise {
                header: 0x61,
                hrp: "addr",
            },
        );
    }

    /// 按习惯写法注册一条链
    pub fn register_chain(
        &mut self,
        chain: ChainId,
        algorithm: SignatureAlgorithm,
        coin_type: u32,
        path_notation: &'static str,
        address_strategy: AddressStrategy,
    ) {
        match DerivationPath::from_tss_notation(path_notation) {
            Ok(derivation_path) => self.register(ChainProfile {
                chain,
                algorithm,
                coin_type,
                path_notation,
                derivation_path,
                address_strategy,
            }),
            Err(e) => self.build_errors.push(format!(
                "Chain {} has invalid derivation path {}: {}",
                chain, path_notation, e
            )),
        }
    }

    /// 注册链配置（同一条链重复注册视为配置错误）
    pub fn register(&mut self, profile: ChainProfile) {
        let chain = profile.chain;
        if self.profiles.insert(chain, profile).is_some() {
            self.build_errors
                .push(format!("Chain {} is registered more than once", chain));
        }
    }

    /// 移除链配置
    pub fn remove(&mut self, chain: ChainId) -> Option<ChainProfile> {
        self.profiles.remove(&chain)
    }

    /// 获取链配置
    pub fn get(&self, chain: ChainId) -> Option<&ChainProfile> {
        self.profiles.get(&chain)
    }

    /// 按名称 / 别名获取
    pub fn get_by_name(&self, name: &str) -> Result<&ChainProfile, AddressError> {
        let chain: ChainId = name.parse()?;
        self.get(chain)
            .ok_or_else(|| AddressError::UnsupportedChain(name.to_string()))
    }

    /// 按签名算法分组获取
    pub fn get_by_algorithm(&self, algorithm: SignatureAlgorithm) -> Vec<&ChainProfile> {
        self.list_all()
            .into_iter()
            .filter(|p| p.algorithm == algorithm)
            .collect()
    }

    /// 列出所有链（按 ChainId 顺序）
    pub fn list_all(&self) -> Vec<&ChainProfile> {
        let sorted: BTreeMap<_, _> = self.profiles.iter().collect();
        sorted.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// 验证链配置完整性
    ///
    /// 硬化索引在这里作为配置错误报告。
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut errors = self.build_errors.clone();

        for chain in ChainId::ALL {
            if !self.profiles.contains_key(&chain) {
                errors.push(format!("Chain {} has no profile", chain));
            }
        }

        for profile in self.list_all() {
            let chain = profile.chain;

            if !profile.path_notation.starts_with("m/") {
                errors.push(format!(
                    "Chain {} has malformed path notation: {:?}",
                    chain, profile.path_notation
                ));
            }

            if let Some((position, index)) = profile.derivation_path.first_hardened() {
                errors.push(format!(
                    "Chain {} has hardened index {:#x} at position {} (only non-hardened derivation is possible)",
                    chain, index, position
                ));
            }

            // 曲线与地址格式必须匹配
            if profile.address_strategy.algorithm() != profile.algorithm {
                errors.push(format!(
                    "Chain {} has incompatible algorithm and address strategy: {:?} / {}",
                    chain,
                    profile.algorithm,
                    profile.address_strategy.tag()
                ));
            }

            // 路径中的 coin type 必须与声明一致
            let declared = profile.derivation_path.indices().get(1).copied();
            if declared != Some(profile.coin_type & !HARDENED_BIT) {
                errors.push(format!(
                    "Chain {} declares coin_type {} but path {} uses {:?}",
                    chain, profile.coin_type, profile.path_notation, declared
                ));
            }

            if profile.address_strategy == AddressStrategy::Evm && profile.coin_type != 60 {
                errors.push(format!(
                    "Chain {} uses EVM addresses but coin_type {} (expected 60)",
                    chain, profile.coin_type
                ));
            }
        }

        if let (Some(thor), Some(maya)) = (
            self.get(ChainId::ThorChain),
            self.get(ChainId::MayaChain),
        ) {
            if thor.derivation_path != maya.derivation_path {
                errors.push("MayaChain must share THORChain's derivation path".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::InvalidRegistry(errors))
        }
    }
}

#[cfg(test)]
mod tests;
