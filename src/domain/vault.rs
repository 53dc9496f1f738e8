//! 金库领域模型
//!
//! `VaultContainer` 是 `.vult` 文件的外层信封；
//! `VaultRecord` 是解码后的公开元数据（不包含任何私钥分片）。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::derivation::ExtendedPublicKey;

/// 外层容器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultContainer {
    pub version: u64,
    /// 解码后的载荷：明文记录，或 nonce || 密文 || tag
    pub payload: Vec<u8>,
    pub is_encrypted: bool,
}

/// MPC 协议类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibType {
    #[default]
    Gg20,
    Dkls,
    /// 未知取值原样保留
    Unknown(i32),
}

impl LibType {
    pub fn from_wire(value: i32) -> Self {
        match value {
            0 => LibType::Gg20,
            1 => LibType::Dkls,
            other => LibType::Unknown(other),
        }
    }

    pub fn to_wire(self) -> i32 {
        match self {
            LibType::Gg20 => 0,
            LibType::Dkls => 1,
            LibType::Unknown(other) => other,
        }
    }
}

/// 金库记录（只读公开元数据）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultRecord {
    pub name: String,
    /// secp256k1 压缩根公钥
    pub public_key_ecdsa: Option<[u8; 33]>,
    /// ed25519 根公钥
    pub public_key_eddsa: Option<[u8; 32]>,
    /// ECDSA 根链码（Cardano 也使用）
    pub chain_code: Option<[u8; 32]>,
    pub signers: Vec<String>,
    pub local_party_id: String,
    pub lib_type: LibType,
    pub created_at: Option<DateTime<Utc>>,
    pub reshare_prefix: Option<String>,
}

impl VaultRecord {
    /// ECDSA 扩展根公钥（公钥与链码都存在时）
    pub fn ecdsa_root(&self) -> Option<ExtendedPublicKey> {
        Some(ExtendedPublicKey {
            public_key: self.public_key_ecdsa?,
            chain_code: self.chain_code?,
        })
    }

    pub fn summary(&self) -> VaultSummary {
        VaultSummary {
            name: self.name.clone(),
            signers: self.signers.clone(),
            local_party_id: self.local_party_id.clone(),
            lib_type: self.lib_type,
            created_at: self.created_at,
            reshare_prefix: self.reshare_prefix.clone(),
            public_key_ecdsa: self.public_key_ecdsa.map(hex::encode),
            public_key_eddsa: self.public_key_eddsa.map(hex::encode),
            hex_chain_code: self.chain_code.map(hex::encode),
        }
    }
}

/// 输出用摘要（十六进制字段）
#[derive(Debug, Clone, Serialize)]
pub struct VaultSummary {
    pub name: String,
    pub signers: Vec<String>,
    pub local_party_id: String,
    pub lib_type: LibType,
    pub created_at: Option<DateTime<Utc>>,
    pub reshare_prefix: Option<String>,
    pub public_key_ecdsa: Option<String>,
    pub public_key_eddsa: Option<String>,
    pub hex_chain_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lib_type_wire_values() {
        assert_eq!(LibType::from_wire(0), LibType::Gg20);
        assert_eq!(LibType::from_wire(1), LibType::Dkls);
        assert_eq!(LibType::from_wire(7), LibType::Unknown(7));
        assert_eq!(LibType::Unknown(7).to_wire(), 7);
    }

    #[test]
    fn test_ecdsa_root_requires_both_parts() {
        let mut record = VaultRecord {
            public_key_ecdsa: Some([2u8; 33]),
            ..Default::default()
        };
        assert!(record.ecdsa_root().is_none());

        record.chain_code = Some([1u8; 32]);
        let root = record.ecdsa_root().unwrap();
        assert_eq!(root.chain_code, [1u8; 32]);
    }

    #[test]
    fn test_summary_hex() {
        let record = VaultRecord {
            name: "main".into(),
            public_key_eddsa: Some([0xab; 32]),
            ..Default::default()
        };
        let summary = record.summary();
        assert_eq!(summary.public_key_eddsa.unwrap(), "ab".repeat(32));
        assert!(summary.public_key_ecdsa.is_none());

        let json = serde_json::to_value(record.summary()).unwrap();
        assert_eq!(json["lib_type"], "gg20");
    }
}
