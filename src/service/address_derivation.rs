//! 地址派生服务
//!
//! 从一份金库记录派生多条链的地址。每条链的结果独立：
//! 某条链失败只记录在该链的条目里，不影响同批次的其他链。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::DerivationConfig;
use crate::domain::address_encoder::{AddressEncoder, KeyMaterial};
use crate::domain::chain_config::{ChainId, ChainRegistry, SignatureAlgorithm};
use crate::domain::derivation::{DerivationPath, PublicKeyDeriver};
use crate::domain::vault::VaultRecord;
use crate::error::{AddressError, DerivationError, RegistryError};
use crate::infrastructure::curve::{CurveBackend, CurveBackendFactory};

/// 派生结果：链 → 地址或错误（按 ChainId 排序）
pub type DerivationReport = BTreeMap<ChainId, Result<String, AddressError>>;

/// 同一批次内按路径缓存的子公钥
type ChildKeys = HashMap<DerivationPath, Result<[u8; 33], DerivationError>>;

pub struct AddressDerivationService {
    registry: Arc<ChainRegistry>,
    deriver: PublicKeyDeriver,
    encoder: AddressEncoder,
    parallel: bool,
}

impl AddressDerivationService {
    /// 创建服务（注册表在这里校验一次）
    pub fn new(
        registry: Arc<ChainRegistry>,
        curve: Arc<dyn CurveBackend>,
    ) -> Result<Self, RegistryError> {
        registry.validate()?;
        Ok(Self {
            registry,
            deriver: PublicKeyDeriver::new(Arc::clone(&curve)),
            encoder: AddressEncoder::new(curve),
            parallel: false,
        })
    }

    /// 按派生配置创建（默认注册表 + 配置的曲线后端）
    pub fn from_config(config: &DerivationConfig) -> anyhow::Result<Self> {
        let curve = CurveBackendFactory::create(config.backend_kind()?);
        let service = Self::new(ChainRegistry::shared(), curve)?.with_parallel(config.parallel);
        tracing::debug!(
            backend = service.deriver.backend_name(),
            parallel = service.parallel,
            "address derivation service ready"
        );
        Ok(service)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// 派生所有已注册链的地址
    pub fn derive_all(&self, record: &VaultRecord) -> DerivationReport {
        self.derive_addresses(record, &ChainId::ALL)
    }

    /// 派生指定链的地址
    pub fn derive_addresses(&self, record: &VaultRecord, chains: &[ChainId]) -> DerivationReport {
        let mut chains = chains.to_vec();
        chains.sort();
        chains.dedup();

        let child_keys = self.derive_child_keys(record, &chains);

        let derive = |chain: &ChainId| (*chain, self.derive_one(record, *chain, &child_keys));
        let report: DerivationReport = if self.parallel {
            chains.par_iter().map(derive).collect()
        } else {
            chains.iter().map(derive).collect()
        };

        let mut failed = 0usize;
        for (chain, result) in &report {
            match result {
                Ok(address) => tracing::debug!(chain = %chain, address = %address, "address derived"),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(chain = %chain, error_code = e.code(), error = %e, "address derivation failed");
                }
            }
        }
        tracing::info!(
            vault = %record.name,
            chains = report.len(),
            failed,
            "address derivation finished"
        );

        report
    }

    /// 按名称派生（保持调用方顺序；未知名称记为 UnsupportedChain）
    pub fn derive_named<S: AsRef<str>>(
        &self,
        record: &VaultRecord,
        names: &[S],
    ) -> Vec<(String, Result<String, AddressError>)> {
        let resolved: Vec<(String, Result<ChainId, AddressError>)> = names
            .iter()
            .map(|name| (name.as_ref().to_string(), name.as_ref().parse::<ChainId>()))
            .collect();

        let chains: Vec<ChainId> = resolved
            .iter()
            .filter_map(|(_, chain)| chain.as_ref().ok().copied())
            .collect();
        let report = self.derive_addresses(record, &chains);

        resolved
            .into_iter()
            .map(|(name, chain)| {
                let result = match chain {
                    Ok(chain) => report
                        .get(&chain)
                        .cloned()
                        .unwrap_or_else(|| Err(AddressError::UnsupportedChain(name.clone()))),
                    Err(e) => {
                        tracing::warn!(chain = %name, "unsupported chain requested");
                        Err(e)
                    }
                };
                (name, result)
            })
            .collect()
    }

    /// 每个不同的路径只派生一次（EVM 七条链、THOR/Maya 共用结果）
    fn derive_child_keys(&self, record: &VaultRecord, chains: &[ChainId]) -> ChildKeys {
        let Some(root) = record.ecdsa_root() else {
            return ChildKeys::new();
        };

        let mut paths: Vec<&DerivationPath> = chains
            .iter()
            .filter_map(|chain| self.registry.get(*chain))
            .filter(|profile| profile.algorithm == SignatureAlgorithm::Ecdsa)
            .map(|profile| &profile.derivation_path)
            .collect();
        paths.sort();
        paths.dedup();

        let derive = |path: &&DerivationPath| {
            let child = self
                .deriver
                .derive_path(&root, path)
                .map(|child| child.public_key);
            ((*path).clone(), child)
        };
        if self.parallel {
            paths.par_iter().map(derive).collect()
        } else {
            paths.iter().map(derive).collect()
        }
    }

    fn derive_one(
        &self,
        record: &VaultRecord,
        chain: ChainId,
        child_keys: &ChildKeys,
    ) -> Result<String, AddressError> {
        let profile = self
            .registry
            .get(chain)
            .ok_or_else(|| AddressError::UnsupportedChain(chain.to_string()))?;

        let missing = |field: &'static str| AddressError::MissingKeyMaterial {
            chain: chain.to_string(),
            missing: field,
        };

        let key = match profile.algorithm {
            SignatureAlgorithm::Ecdsa => {
                if record.public_key_ecdsa.is_none() {
                    return Err(missing("public_key_ecdsa"));
                }
                if record.chain_code.is_none() {
                    return Err(missing("hex_chain_code"));
                }
                let public_key = child_keys
                    .get(&profile.derivation_path)
                    .cloned()
                    .ok_or_else(|| {
                        AddressError::encoding(format!(
                            "no child key derived for {}",
                            profile.derivation_path
                        ))
                    })??;
                KeyMaterial::Ecdsa { public_key }
            }
            SignatureAlgorithm::Eddsa => KeyMaterial::Eddsa {
                public_key: record
                    .public_key_eddsa
                    .ok_or_else(|| missing("public_key_eddsa"))?,
                chain_code: record.chain_code,
            },
        };

        self.encoder.encode_address(&key, profile)
    }
}

#[cfg(test)]
mod tests;
