//! 链注册表测试
//!
//! 验证默认注册表完整、路径非强化、曲线与地址格式匹配

#[cfg(test)]
mod tests {
    use crate::domain::chain_config::{
        AddressStrategy, ChainId, ChainProfile, ChainRegistry, SignatureAlgorithm,
    };
    use crate::domain::derivation::DerivationPath;
    use crate::error::RegistryError;

    #[test]
    fn test_default_registry_is_valid() {
        let registry = ChainRegistry::new();
        registry.validate().unwrap();
        assert_eq!(registry.len(), ChainId::ALL.len());
    }

    #[test]
    fn test_tss_paths_strip_hardening() {
        let registry = ChainRegistry::new();

        let btc = registry.get(ChainId::Bitcoin).unwrap();
        assert_eq!(btc.path_notation, "m/84'/0'/0'/0/0");
        assert_eq!(btc.derivation_path.indices(), &[84, 0, 0, 0, 0]);

        let thor = registry.get(ChainId::ThorChain).unwrap();
        assert_eq!(thor.derivation_path.indices(), &[44, 931, 0, 0, 0]);
    }

    #[test]
    fn test_evm_chains_share_path() {
        let registry = ChainRegistry::new();
        let eth = registry.get(ChainId::Ethereum).unwrap();

        for chain in ChainId::EVM {
            let profile = registry.get(chain).unwrap();
            assert_eq!(profile.coin_type, 60);
            assert_eq!(profile.derivation_path, eth.derivation_path);
            assert_eq!(profile.address_strategy, AddressStrategy::Evm);
        }
    }

    #[test]
    fn test_maya_reuses_thorchain_path() {
        let registry = ChainRegistry::new();
        let thor = registry.get(ChainId::ThorChain).unwrap();
        let maya = registry.get(ChainId::MayaChain).unwrap();

        assert_eq!(thor.derivation_path, maya.derivation_path);
        assert_eq!(maya.address_strategy, AddressStrategy::CosmosBech32 { hrp: "maya" });
    }

    #[test]
    fn test_algorithm_grouping() {
        let registry = ChainRegistry::new();
        let eddsa: Vec<ChainId> = registry
            .get_by_algorithm(SignatureAlgorithm::Eddsa)
            .into_iter()
            .map(|p| p.chain)
            .collect();

        assert_eq!(
            eddsa,
            vec![ChainId::Solana, ChainId::Sui, ChainId::Polkadot, ChainId::Cardano]
        );
    }

    #[test]
    fn test_lookup_by_alias() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.get_by_name("Bitcoin").unwrap().chain, ChainId::Bitcoin);
        assert_eq!(registry.get_by_name("BNB").unwrap().chain, ChainId::BscChain);
        assert!(registry.get_by_name("dogechain").is_err());
    }

    #[test]
    fn test_hardened_index_rejected_at_validation() {
        let mut registry = ChainRegistry::new();
        registry.remove(ChainId::Bitcoin);
        registry.register(ChainProfile {
            chain: ChainId::Bitcoin,
            algorithm: SignatureAlgorithm::Ecdsa,
            coin_type: 0,
            path_notation: "m/84'/0'/0'/0/0",
            derivation_path: DerivationPath::new(vec![84, 0, 0x8000_0000, 0, 0]),
            address_strategy: AddressStrategy::SegwitV0 { hrp: "bc" },
        });

        let Err(RegistryError::InvalidRegistry(errors)) = registry.validate() else {
            panic!("hardened index must be rejected");
        };
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("hardened"));
    }

    #[test]
    fn test_incompatible_strategy_rejected() {
        let mut registry = ChainRegistry::new();
        registry.remove(ChainId::Solana);
        registry.register_chain(
            ChainId::Solana,
            SignatureAlgorithm::Ecdsa,
            501,
            "m/44'/501'/0'/0'",
            AddressStrategy::SolanaBase58,
        );

        let err = registry.validate().unwrap_err();
        assert!(err.to_string().contains("incompatible"));
    }

    #[test]
    fn test_missing_and_duplicate_chains_reported() {
        let mut registry = ChainRegistry::new();
        registry.remove(ChainId::Dash);
        registry.register_chain(
            ChainId::Sui,
            SignatureAlgorithm::Eddsa,
            784,
            "m/44'/784'/0'/0'/0'",
            AddressStrategy::SuiBlake2b,
        );

        let Err(RegistryError::InvalidRegistry(errors)) = registry.validate() else {
            panic!("registry should be invalid");
        };
        assert!(errors.iter().any(|e| e.contains("dash has no profile")));
        assert!(errors.iter().any(|e| e.contains("sui is registered more than once")));
    }

    #[test]
    fn test_unparseable_notation_reported() {
        let mut registry = ChainRegistry::new();
        registry.remove(ChainId::Noble);
        registry.register_chain(
            ChainId::Noble,
            SignatureAlgorithm::Ecdsa,
            118,
            "m/44'/abc'/0'",
            AddressStrategy::CosmosBech32 { hrp: "noble" },
        );

        let err = registry.validate().unwrap_err();
        assert!(err.to_string().contains("invalid derivation path"));
    }
}
