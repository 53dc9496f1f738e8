//! 地址派生服务测试
//!
//! 覆盖链间隔离、EVM 地址一致、同路径只派生一次、并行与串行结果一致

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::domain::chain_config::{ChainId, ChainRegistry};
    use crate::domain::vault::VaultRecord;
    use crate::error::{AddressError, CurveError, RegistryError};
    use crate::infrastructure::curve::{CurveBackend, K256Backend};
    use crate::service::address_derivation::AddressDerivationService;
    use crate::utils::address_validator::AddressValidator;

    // BIP32 测试向量 2 的主扩展公钥
    const ROOT_XPUB: &str = "xpub661MyMwAqRbcFW31YEwpkMuc5THy2PSt5bDMsktWQcFF8syAmRUapSCGu8ED9W6oDMSgv6Zz8idoc4a6mr8BDzTJY47LJhkJ8UB7WEGuduB";
    // RFC 8032 测试向量 1 的公钥
    const ED_PK: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    struct CountingBackend {
        tweak_calls: AtomicUsize,
    }

    impl CurveBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn tweak_add(&self, public_key: &[u8; 33], tweak: &[u8; 32]) -> Result<[u8; 33], CurveError> {
            self.tweak_calls.fetch_add(1, Ordering::SeqCst);
            K256Backend.tweak_add(public_key, tweak)
        }

        fn decompress(&self, public_key: &[u8; 33]) -> Result<[u8; 65], CurveError> {
            K256Backend.decompress(public_key)
        }
    }

    fn record() -> VaultRecord {
        let raw = bs58::decode(ROOT_XPUB).with_check(None).into_vec().unwrap();
        VaultRecord {
            name: "Test Vault".into(),
            public_key_ecdsa: Some(raw[45..78].try_into().unwrap()),
            public_key_eddsa: Some(hex::decode(ED_PK).unwrap().try_into().unwrap()),
            chain_code: Some(raw[13..45].try_into().unwrap()),
            signers: vec!["a".into(), "b".into()],
            local_party_id: "a".into(),
            ..Default::default()
        }
    }

    fn service() -> AddressDerivationService {
        AddressDerivationService::new(ChainRegistry::shared(), Arc::new(K256Backend)).unwrap()
    }

    #[test]
    fn test_every_chain_derives_a_valid_address() {
        let report = service().derive_all(&record());
        assert_eq!(report.len(), ChainId::ALL.len());

        for (chain, result) in &report {
            let address = result.as_ref().unwrap_or_else(|e| panic!("{}: {}", chain, e));
            assert!(
                AddressValidator::validate(chain.as_str(), address).unwrap(),
                "{} produced invalid address {}",
                chain,
                address
            );
        }
    }

    #[test]
    fn test_evm_chains_share_one_address() {
        let report = service().derive_addresses(&record(), &ChainId::EVM);
        let eth = report[&ChainId::Ethereum].clone().unwrap();
        for chain in ChainId::EVM {
            assert_eq!(report[&chain].as_ref().unwrap(), &eth);
        }
    }

    #[test]
    fn test_thor_and_maya_share_key_hash() {
        let report = service().derive_addresses(&record(), &[ChainId::ThorChain, ChainId::MayaChain]);
        let (thor_hrp, thor) = bech32::decode(report[&ChainId::ThorChain].as_ref().unwrap()).unwrap();
        let (maya_hrp, maya) = bech32::decode(report[&ChainId::MayaChain].as_ref().unwrap()).unwrap();

        assert_eq!(thor_hrp.to_string(), "thor");
        assert_eq!(maya_hrp.to_string(), "maya");
        assert_eq!(thor, maya);
    }

    #[test]
    fn test_one_derivation_per_distinct_path() {
        let backend = Arc::new(CountingBackend {
            tweak_calls: AtomicUsize::new(0),
        });
        let service = AddressDerivationService::new(ChainRegistry::shared(), backend.clone()).unwrap();

        service.derive_addresses(&record(), &ChainId::EVM);
        // 七条 EVM 链共用 m/44/60/0/0/0，五级路径只需五次曲线运算
        assert_eq!(backend.tweak_calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_missing_ecdsa_key_isolated_per_chain() {
        let mut record = record();
        record.public_key_ecdsa = None;

        let report = service().derive_all(&record);
        assert_eq!(
            report[&ChainId::Bitcoin],
            Err(AddressError::MissingKeyMaterial {
                chain: "btc".into(),
                missing: "public_key_ecdsa"
            })
        );
        assert!(report[&ChainId::Solana].is_ok());
        assert!(report[&ChainId::Cardano].is_ok());
    }

    #[test]
    fn test_missing_chain_code() {
        let mut record = record();
        record.chain_code = None;

        let report = service().derive_all(&record);
        assert_eq!(
            report[&ChainId::Ethereum],
            Err(AddressError::MissingKeyMaterial {
                chain: "eth".into(),
                missing: "hex_chain_code"
            })
        );
        assert_eq!(
            report[&ChainId::Cardano],
            Err(AddressError::MissingKeyMaterial {
                chain: "ada".into(),
                missing: "hex_chain_code"
            })
        );
        assert!(report[&ChainId::Sui].is_ok());
        assert!(report[&ChainId::Polkadot].is_ok());
    }

    #[test]
    fn test_invalid_ecdsa_key_does_not_affect_eddsa() {
        let mut record = record();
        let mut bogus = [0xffu8; 33];
        bogus[0] = 0x02;
        record.public_key_ecdsa = Some(bogus);

        let report = service().derive_all(&record);
        assert!(matches!(
            report[&ChainId::Bitcoin],
            Err(AddressError::Derivation(_))
        ));
        assert!(report[&ChainId::Solana].is_ok());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = service().derive_all(&record());
        let parallel = service().with_parallel(true).derive_all(&record());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_derive_named_keeps_caller_order() {
        let results = service().derive_named(&record(), &["SOL", "ton", "bitcoin"]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, "SOL");
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].1, Err(AddressError::UnsupportedChain("ton".into())));
        assert!(results[2].1.as_ref().unwrap().starts_with("bc1q"));
    }

    #[test]
    fn test_invalid_registry_rejected() {
        let mut registry = ChainRegistry::new();
        registry.remove(ChainId::Tron);

        let result = AddressDerivationService::new(Arc::new(registry), Arc::new(K256Backend));
        assert!(matches!(result, Err(RegistryError::InvalidRegistry(_))));
    }
}
