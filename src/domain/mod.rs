//! Domain 模块
//!
//! 金库模型、链注册表、公钥派生与地址编码

pub mod address_encoder;
pub mod chain_config;
pub mod derivation;
pub mod vault;

// 重新导出常用类型
pub use address_encoder::{AddressEncoder, KeyMaterial};
pub use chain_config::{AddressStrategy, ChainId, ChainProfile, ChainRegistry, SignatureAlgorithm};
pub use derivation::{DerivationPath, ExtendedPublicKey, PublicKeyDeriver};
pub use vault::{LibType, VaultContainer, VaultRecord, VaultSummary};
