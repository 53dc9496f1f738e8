//! 金库记录编解码
//!
//! protobuf 字节 ↔ `VaultRecord`。十六进制字段在这里一次性校验并转成定长数组，
//! 后续模块不再处理字符串形式的公钥。

use chrono::{DateTime, Utc};
use prost::Message;

use crate::domain::vault::{LibType, VaultRecord};
use crate::error::VaultError;
use crate::infrastructure::proto::{TimestampProto, VaultProto};

/// 解码金库记录
pub fn decode_vault_record(bytes: &[u8]) -> Result<VaultRecord, VaultError> {
    let proto = VaultProto::decode(bytes)
        .map_err(|e| VaultError::MalformedRecord(format!("protobuf: {}", e)))?;

    let public_key_ecdsa = decode_hex_field::<33>("public_key_ecdsa", &proto.public_key_ecdsa)?;
    if let Some(key) = public_key_ecdsa {
        if !matches!(key[0], 0x02 | 0x03) {
            return Err(VaultError::MalformedRecord(format!(
                "public_key_ecdsa: expected compressed SEC1 prefix, got {:#04x}",
                key[0]
            )));
        }
    }

    Ok(VaultRecord {
        name: proto.name,
        public_key_ecdsa,
        public_key_eddsa: decode_hex_field::<32>("public_key_eddsa", &proto.public_key_eddsa)?,
        chain_code: decode_hex_field::<32>("hex_chain_code", &proto.hex_chain_code)?,
        signers: proto.signers,
        local_party_id: proto.local_party_id,
        lib_type: LibType::from_wire(proto.lib_type),
        created_at: proto.created_at.map(decode_timestamp).transpose()?,
        reshare_prefix: Some(proto.reshare_prefix).filter(|p| !p.is_empty()),
    })
}

/// 编码金库记录（不含私钥分片）
pub fn encode_vault_record(record: &VaultRecord) -> Vec<u8> {
    VaultProto {
        name: record.name.clone(),
        public_key_ecdsa: record.public_key_ecdsa.map(hex::encode).unwrap_or_default(),
        public_key_eddsa: record.public_key_eddsa.map(hex::encode).unwrap_or_default(),
        signers: record.signers.clone(),
        created_at: record.created_at.map(|t| TimestampProto {
            seconds: t.timestamp(),
            nanos: t.timestamp_subsec_nanos() as i32,
        }),
        hex_chain_code: record.chain_code.map(hex::encode).unwrap_or_default(),
        local_party_id: record.local_party_id.clone(),
        reshare_prefix: record.reshare_prefix.clone().unwrap_or_default(),
        lib_type: record.lib_type.to_wire(),
    }
    .encode_to_vec()
}

/// 空字符串表示字段缺失；非空则必须是定长十六进制
fn decode_hex_field<const N: usize>(
    field: &'static str,
    value: &str,
) -> Result<Option<[u8; N]>, VaultError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let bytes = hex::decode(value)
        .map_err(|e| VaultError::MalformedRecord(format!("{}: invalid hex: {}", field, e)))?;
    let len = bytes.len();
    bytes.try_into().map(Some).map_err(|_| {
        VaultError::MalformedRecord(format!("{}: expected {} bytes, got {}", field, N, len))
    })
}

fn decode_timestamp(ts: TimestampProto) -> Result<DateTime<Utc>, VaultError> {
    u32::try_from(ts.nanos)
        .ok()
        .and_then(|nanos| DateTime::from_timestamp(ts.seconds, nanos))
        .ok_or_else(|| {
            VaultError::MalformedRecord(format!(
                "created_at out of range: {}s {}ns",
                ts.seconds, ts.nanos
            ))
        })
}
