//! 链标识符标准化模块
//!
//! 统一命令行、配置文件与调用方传入的链名称

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::domain::chain_config::ChainId;
use crate::error::AddressError;

/// 链标识符配置
#[derive(Debug, Clone)]
pub struct ChainIdentifier {
    /// 规范标识
    pub chain: ChainId,
    /// 别名列表（不区分大小写）
    pub aliases: &'static [&'static str],
}

/// 链标识符注册表（静态初始化，键为小写）
static CHAIN_ALIASES: Lazy<HashMap<String, ChainId>> = Lazy::new(|| {
    let chains = [
        ChainIdentifier {
            chain: ChainId::Bitcoin,
            aliases: &["bitcoin", "xbt"],
        },
        ChainIdentifier {
            chain: ChainId::Litecoin,
            aliases: &["litecoin"],
        },
        ChainIdentifier {
            chain: ChainId::Dogecoin,
            aliases: &["dogecoin"],
        },
        ChainIdentifier {
            chain: ChainId::BitcoinCash,
            aliases: &["bitcoincash", "bitcoin-cash", "bitcoin cash"],
        },
        ChainIdentifier {
            chain: ChainId::Dash,
            aliases: &[],
        },
        ChainIdentifier {
            chain: ChainId::Zcash,
            aliases: &["zcash"],
        },
        ChainIdentifier {
            chain: ChainId::Ethereum,
            aliases: &["ethereum", "mainnet"],
        },
        ChainIdentifier {
            chain: ChainId::BscChain,
            aliases: &["bnb", "binance", "bnb smart chain", "bsc chain"],
        },
        ChainIdentifier {
            chain: ChainId::Avalanche,
            aliases: &["avalanche", "avalanche c-chain"],
        },
        ChainIdentifier {
            chain: ChainId::Polygon,
            aliases: &["polygon", "pol"],
        },
        ChainIdentifier {
            chain: ChainId::Optimism,
            aliases: &["optimism"],
        },
        ChainIdentifier {
            chain: ChainId::Arbitrum,
            aliases: &["arbitrum", "arbitrum one"],
        },
        ChainIdentifier {
            chain: ChainId::Base,
            aliases: &[],
        },
        ChainIdentifier {
            chain: ChainId::ThorChain,
            aliases: &["thorchain", "rune"],
        },
        ChainIdentifier {
            chain: ChainId::MayaChain,
            aliases: &["mayachain", "cacao"],
        },
        ChainIdentifier {
            chain: ChainId::Cosmos,
            aliases: &["cosmos", "gaia", "cosmos hub"],
        },
        ChainIdentifier {
            chain: ChainId::Osmosis,
            aliases: &["osmosis"],
        },
        ChainIdentifier {
            chain: ChainId::Dydx,
            aliases: &[],
        },
        ChainIdentifier {
            chain: ChainId::Kujira,
            aliases: &["kujira"],
        },
        ChainIdentifier {
            chain: ChainId::Terra,
            aliases: &["terra"],
        },
        ChainIdentifier {
            chain: ChainId::Noble,
            aliases: &[],
        },
        ChainIdentifier {
            chain: ChainId::Tron,
            aliases: &["tron"],
        },
        ChainIdentifier {
            chain: ChainId::Ripple,
            aliases: &["ripple", "xrpl"],
        },
        ChainIdentifier {
            chain: ChainId::Solana,
            aliases: &["solana"],
        },
        ChainIdentifier {
            chain: ChainId::Sui,
            aliases: &[],
        },
        ChainIdentifier {
            chain: ChainId::Polkadot,
            aliases: &["polkadot"],
        },
        ChainIdentifier {
            chain: ChainId::Cardano,
            aliases: &["cardano"],
        },
    ];

    let mut registry = HashMap::new();
    for identifier in chains {
        let chain = identifier.chain;
        registry.insert(chain.as_str().to_string(), chain);
        registry.insert(chain.name().to_lowercase(), chain);
        for alias in identifier.aliases {
            registry.insert(alias.to_lowercase(), chain);
        }
    }
    registry
});

/// 标准化链标识符
///
/// 接受短标识、链名称或别名（不区分大小写）。
///
/// ```rust
/// # use vultaddr::utils::chain_normalizer::normalize_chain_identifier;
/// # use vultaddr::domain::chain_config::ChainId;
/// assert_eq!(normalize_chain_identifier("BTC").unwrap(), ChainId::Bitcoin);
/// assert_eq!(normalize_chain_identifier("Ethereum").unwrap(), ChainId::Ethereum);
/// ```
pub fn normalize_chain_identifier(input: &str) -> Result<ChainId, AddressError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(AddressError::UnsupportedChain(
            "chain identifier cannot be empty".to_string(),
        ));
    }

    CHAIN_ALIASES
        .get(&trimmed.to_lowercase())
        .copied()
        .ok_or_else(|| AddressError::UnsupportedChain(trimmed.to_string()))
}

/// 解析逗号分隔的链列表（如 "btc,eth,sol"）
pub fn parse_chain_list(input: &str) -> Result<Vec<ChainId>, AddressError> {
    let mut chains = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let chain = normalize_chain_identifier(part)?;
        if !chains.contains(&chain) {
            chains.push(chain);
        }
    }
    Ok(chains)
}

/// 判断是否为EVM链
pub fn is_evm_chain(chain: &str) -> bool {
    normalize_chain_identifier(chain)
        .map(|c| c.is_evm())
        .unwrap_or(false)
}
