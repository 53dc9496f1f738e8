//! 测试辅助模块
//! 构造测试金库记录并写出 .vult 文件

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;
use vultaddr::domain::VaultRecord;
use vultaddr::infrastructure::encryption::KeyDerivation;
use vultaddr::service::{container_codec, vault_record_codec};

/// BIP32 测试向量 2 的主扩展公钥
pub const ROOT_XPUB: &str = "xpub661MyMwAqRbcFW31YEwpkMuc5THy2PSt5bDMsktWQcFF8syAmRUapSCGu8ED9W6oDMSgv6Zz8idoc4a6mr8BDzTJY47LJhkJ8UB7WEGuduB";

/// RFC 8032 测试向量 1 的公钥
pub const ED_PK: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

pub const PASSWORD: &str = "correct horse battery staple";

/// 从 xpub 字符串取出 (公钥, 链码)
pub fn split_xpub(xpub: &str) -> ([u8; 33], [u8; 32]) {
    let raw = bs58::decode(xpub).with_check(None).into_vec().unwrap();
    assert_eq!(raw.len(), 78);
    (raw[45..78].try_into().unwrap(), raw[13..45].try_into().unwrap())
}

/// 完整的测试金库记录
pub fn test_record() -> VaultRecord {
    let (public_key, chain_code) = split_xpub(ROOT_XPUB);
    VaultRecord {
        name: "Integration Vault".into(),
        public_key_ecdsa: Some(public_key),
        public_key_eddsa: Some(hex::decode(ED_PK).unwrap().try_into().unwrap()),
        chain_code: Some(chain_code),
        signers: vec!["laptop-1a2b".into(), "phone-3c4d".into()],
        local_party_id: "laptop-1a2b".into(),
        reshare_prefix: Some("9f8e".into()),
        ..Default::default()
    }
}

/// 编码为 .vult 文件内容
pub fn vult_text(record: &VaultRecord, password: Option<&str>, kdf: KeyDerivation) -> String {
    let bytes = vault_record_codec::encode_vault_record(record);
    let container = container_codec::seal_container_with(&bytes, password, kdf).unwrap();
    container_codec::encode_container(&container)
}

/// 写入临时目录，返回 (目录守卫, 文件路径)
pub fn write_vult(record: &VaultRecord, password: Option<&str>) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test-vault.vult");
    std::fs::write(&path, vult_text(record, password, KeyDerivation::LegacySha256)).unwrap();
    (dir, path)
}
