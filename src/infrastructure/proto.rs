//! `.vult` 文件的 protobuf 结构
//!
//! 手工声明的 prost 消息，不依赖 build.rs。
//! `Vault` 的字段 7（key_shares，私钥分片）刻意不声明：解码时直接跳过。

use prost::Message;

/// 外层容器
#[derive(Clone, PartialEq, Message)]
pub struct VaultContainerProto {
    #[prost(uint64, tag = "1")]
    pub version: u64,
    /// base64(Vault) 或 base64(nonce || ciphertext || tag)
    #[prost(string, tag = "2")]
    pub vault: String,
    #[prost(bool, tag = "3")]
    pub is_encrypted: bool,
}

/// google.protobuf.Timestamp
#[derive(Clone, PartialEq, Message)]
pub struct TimestampProto {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

/// 金库记录（公开字段）
#[derive(Clone, PartialEq, Message)]
pub struct VaultProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub public_key_ecdsa: String,
    #[prost(string, tag = "3")]
    pub public_key_eddsa: String,
    #[prost(string, repeated, tag = "4")]
    pub signers: Vec<String>,
    #[prost(message, optional, tag = "5")]
    pub created_at: Option<TimestampProto>,
    #[prost(string, tag = "6")]
    pub hex_chain_code: String,
    #[prost(string, tag = "8")]
    pub local_party_id: String,
    #[prost(string, tag = "9")]
    pub reshare_prefix: String,
    /// LibType 枚举（GG20 = 0, DKLS = 1）
    #[prost(int32, tag = "10")]
    pub lib_type: i32,
}
