//! 地址验证模块
//!
//! 按链的地址策略完整解码地址（校验和、前缀、长度），
//! 用于 `verify` 命令以及对派生结果的自检。

use bech32::Fe32;

use crate::domain::address_encoder::{blake2b, ss58_prefix_bytes};
use crate::domain::chain_config::{AddressStrategy, ChainRegistry};
use crate::error::AddressError;
use crate::utils::{cashaddr, chain_normalizer};

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    /// 验证地址格式
    ///
    /// # 参数
    /// - `chain`: 链标识符（会自动标准化）
    /// - `address`: 待验证的地址
    ///
    /// # 返回
    /// - Ok(true): 地址有效
    /// - Ok(false): 地址无效
    /// - Err: 不支持的链
    pub fn validate(chain: &str, address: &str) -> Result<bool, AddressError> {
        let chain = chain_normalizer::normalize_chain_identifier(chain)?;
        let registry = ChainRegistry::shared();
        let profile = registry
            .get(chain)
            .ok_or_else(|| AddressError::UnsupportedChain(chain.to_string()))?;

        Ok(Self::validate_for_strategy(&profile.address_strategy, address.trim()))
    }

    /// 按地址策略验证
    pub fn validate_for_strategy(strategy: &AddressStrategy, address: &str) -> bool {
        match *strategy {
            AddressStrategy::SegwitV0 { hrp } => Self::validate_segwit_v0(address, hrp),
            AddressStrategy::Base58P2pkh { version } => {
                Self::validate_base58_check(address, version, 20)
            }
            AddressStrategy::CashAddr { prefix } => matches!(
                cashaddr::decode(address, prefix),
                Ok((cashaddr::KIND_P2PKH, hash)) if hash.len() == 20
            ),
            AddressStrategy::CosmosBech32 { hrp } => Self::validate_bech32(address, hrp, |data| {
                data.len() == 20
            }),
            AddressStrategy::Evm => Self::validate_evm_address(address),
            AddressStrategy::TronBase58 { version } => {
                Self::validate_base58_check(address, &[version], 20)
            }
            AddressStrategy::RippleBase58 { version } => {
                match bs58::decode(address)
                    .with_alphabet(bs58::Alphabet::RIPPLE)
                    .with_check(None)
                    .into_vec()
                {
                    Ok(decoded) => decoded.len() == 21 && decoded[0] == version,
                    Err(_) => false,
                }
            }
            AddressStrategy::SolanaBase58 => Self::validate_solana_address(address),
            AddressStrategy::SuiBlake2b => Self::validate_sui_address(address),
            AddressStrategy::Ss58 { prefix } => Self::validate_ss58_address(address, prefix),
            AddressStrategy::CardanoEnterprise { header, hrp } => {
                Self::validate_bech32(address, hrp, |data| data.len() == 29 && data[0] == header)
            }
        }
    }

    /// 验证EVM地址（支持EIP-55 Checksum）
    fn validate_evm_address(address: &str) -> bool {
        // 1. 基本格式检查
        let Some(hex_part) = address.strip_prefix("0x") else {
            return false;
        };

        if hex_part.len() != 40 {
            return false;
        }

        // 2. 验证hex字符
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }

        // 3. EIP-55 Checksum验证（如果地址包含大写字母）
        if hex_part.chars().any(|c| c.is_ascii_uppercase()) {
            return Self::verify_eip55_checksum(address);
        }

        true
    }

    /// 验证EIP-55 Checksum
    /// https://eips.ethereum.org/EIPS/eip-55
    fn verify_eip55_checksum(address: &str) -> bool {
        let Ok(bytes) = hex::decode(&address[2..]) else {
            return false;
        };
        let Ok(account) = <[u8; 20]>::try_from(bytes.as_slice()) else {
            return false;
        };
        crate::domain::address_encoder::to_eip55(&account) == address
    }

    /// 验证Solana地址（Base58编码，32字节）
    fn validate_solana_address(address: &str) -> bool {
        // 典型长度：32-44个字符
        if address.len() < 32 || address.len() > 44 {
            return false;
        }

        match bs58::decode(address).into_vec() {
            Ok(decoded) => decoded.len() == 32,
            Err(_) => false,
        }
    }

    /// Sui：0x + 64 位小写十六进制
    fn validate_sui_address(address: &str) -> bool {
        match address.strip_prefix("0x") {
            Some(hex_part) => {
                hex_part.len() == 64
                    && hex_part
                        .chars()
                        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            }
            None => false,
        }
    }

    /// Base58Check：版本前缀 + 固定长度负载
    fn validate_base58_check(address: &str, version: &[u8], body_len: usize) -> bool {
        match bs58::decode(address).with_check(None).into_vec() {
            Ok(decoded) => {
                decoded.len() == version.len() + body_len && decoded.starts_with(version)
            }
            Err(_) => false,
        }
    }

    /// P2WPKH：见证版本 0，20 字节程序
    fn validate_segwit_v0(address: &str, expected_hrp: &str) -> bool {
        match bech32::segwit::decode(address) {
            Ok((hrp, version, program)) => {
                hrp.to_lowercase() == expected_hrp && version == Fe32::Q && program.len() == 20
            }
            Err(_) => false,
        }
    }

    /// 普通 bech32：校验前缀并检查负载
    fn validate_bech32(address: &str, expected_hrp: &str, payload_ok: impl Fn(&[u8]) -> bool) -> bool {
        match bech32::decode(address) {
            Ok((hrp, data)) => hrp.to_lowercase() == expected_hrp && payload_ok(&data),
            Err(_) => false,
        }
    }

    /// SS58：前缀 + 32 字节公钥 + 2 字节 blake2b 校验和
    fn validate_ss58_address(address: &str, expected_prefix: u16) -> bool {
        let Ok(prefix) = ss58_prefix_bytes(expected_prefix) else {
            return false;
        };
        let Ok(decoded) = bs58::decode(address).into_vec() else {
            return false;
        };
        if decoded.len() != prefix.len() + 34 || !decoded.starts_with(&prefix) {
            return false;
        }

        let (body, checksum) = decoded.split_at(decoded.len() - 2);
        match blake2b(&[b"SS58PRE", body], 64) {
            Ok(hash) => hash[..2] == *checksum,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_address_validation() {
        // 有效地址（全小写 - 无checksum，总是通过）
        assert!(AddressValidator::validate(
            "ethereum",
            "0x742d35cc6634c0532925a3b844bc9e7595f0beb6"
        )
        .unwrap());

        // EIP-55 大小写正确 / 错误
        assert!(AddressValidator::validate("ETH", "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap());
        assert!(!AddressValidator::validate("ETH", "0x7e5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap());

        // 无效地址
        assert!(!AddressValidator::validate("ethereum", "0x123").unwrap());
        assert!(!AddressValidator::validate(
            "ethereum",
            "742d35Cc6634C0532925a3b844Bc9e7595f0bEb6"
        )
        .unwrap());
        assert!(!AddressValidator::validate(
            "ethereum",
            "0xGGGG35Cc6634C0532925a3b844Bc9e7595f0bEb6"
        )
        .unwrap());
    }

    #[test]
    fn test_solana_address_validation() {
        assert!(AddressValidator::validate(
            "solana",
            "DYw8jCTfwHNRJhhmFcbXvVDTqWMEVFBX6ZKUmG5CNSKK"
        )
        .unwrap());

        assert!(!AddressValidator::validate("solana", "invalid").unwrap());
        assert!(!AddressValidator::validate(
            "solana",
            "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb6"
        )
        .unwrap());
    }

    #[test]
    fn test_bitcoin_address_validation() {
        // Bech32 P2WPKH
        assert!(AddressValidator::validate(
            "bitcoin",
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        )
        .unwrap());

        // 只接受 P2WPKH：legacy 与测试网前缀都不通过
        assert!(!AddressValidator::validate("bitcoin", "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").unwrap());
        assert!(!AddressValidator::validate(
            "bitcoin",
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"
        )
        .unwrap());

        // 校验和错误
        assert!(!AddressValidator::validate(
            "bitcoin",
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5"
        )
        .unwrap());
        assert!(!AddressValidator::validate("bitcoin", "invalid").unwrap());
    }

    #[test]
    fn test_bitcoin_cash_validation() {
        assert!(AddressValidator::validate(
            "bch",
            "bitcoincash:qr6m7j9njldwwzlg9v7v53unlr4jkmx6eylep8ekg2"
        )
        .unwrap());
        assert!(!AddressValidator::validate(
            "bch",
            "bitcoincash:qr6m7j9njldwwzlg9v7v53unlr4jkmx6eylep8ekg3"
        )
        .unwrap());
    }

    #[test]
    fn test_polkadot_validation() {
        assert!(AddressValidator::validate(
            "dot",
            "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5"
        )
        .unwrap());
        // 同一公钥的通用前缀 (42) 不是 Polkadot 地址
        assert!(!AddressValidator::validate(
            "dot",
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        )
        .unwrap());
    }

    #[test]
    fn test_sui_validation() {
        let address = format!("0x{}", "ab".repeat(32));
        assert!(AddressValidator::validate("sui", &address).unwrap());
        assert!(!AddressValidator::validate("sui", &address.to_uppercase()).unwrap());
        assert!(!AddressValidator::validate("sui", "0xabc").unwrap());
    }

    #[test]
    fn test_chain_alias_support() {
        let valid_addr_lower = "0x742d35cc6634c0532925a3b844bc9e7595f0beb6";

        assert!(AddressValidator::validate("ETH", valid_addr_lower).unwrap());
        assert!(AddressValidator::validate("BSC", valid_addr_lower).unwrap());
        assert!(AddressValidator::validate("Base", valid_addr_lower).unwrap());
    }

    #[test]
    fn test_unsupported_chain() {
        assert_eq!(
            AddressValidator::validate("ton", "EQ..."),
            Err(AddressError::UnsupportedChain("ton".into()))
        );
    }
}
