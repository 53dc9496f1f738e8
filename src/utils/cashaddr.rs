//! CashAddr 编码（Bitcoin Cash）
//!
//! 与 bech32 共用字母表，但校验和是 40 位 BCH 码，前缀参与校验但不出现在 5 位数据中。

use bech32::primitives::iter::{ByteIterExt, Fe32IterExt};
use bech32::Fe32;

use crate::error::AddressError;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATORS: [u64; 5] = [
    0x98_f2bc_8e61,
    0x79_b76d_99e2,
    0xf3_3e5f_b3c4,
    0xae_2eab_e2a8,
    0x1e_4f43_e470,
];

const CHECKSUM_LEN: usize = 8;

/// P2PKH 类型位
pub const KIND_P2PKH: u8 = 0;

fn polymod(values: impl IntoIterator<Item = u8>) -> u64 {
    let mut c: u64 = 1;
    for d in values {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(d);
        for (i, generator) in GENERATORS.iter().enumerate() {
            if c0 & (1 << i) != 0 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}

fn prefix_values(prefix: &str) -> impl Iterator<Item = u8> + '_ {
    prefix.bytes().map(|b| b & 0x1f).chain(std::iter::once(0))
}

fn size_bits(hash_len: usize) -> Option<u8> {
    match hash_len {
        20 => Some(0),
        24 => Some(1),
        28 => Some(2),
        32 => Some(3),
        40 => Some(4),
        48 => Some(5),
        56 => Some(6),
        64 => Some(7),
        _ => None,
    }
}

/// 编码 CashAddr 地址（带前缀）
pub fn encode(prefix: &str, kind: u8, hash: &[u8]) -> Result<String, AddressError> {
    let size = size_bits(hash.len()).ok_or_else(|| {
        AddressError::encoding(format!("cashaddr: unsupported hash length {}", hash.len()))
    })?;
    let version = (kind << 3) | size;

    let payload: Vec<u8> = std::iter::once(version)
        .chain(hash.iter().copied())
        .bytes_to_fes()
        .map(Fe32::to_u8)
        .collect();

    let checksum = polymod(
        prefix_values(prefix)
            .chain(payload.iter().copied())
            .chain([0u8; CHECKSUM_LEN]),
    );

    let mut address = String::with_capacity(prefix.len() + 1 + payload.len() + CHECKSUM_LEN);
    address.push_str(prefix);
    address.push(':');
    for value in &payload {
        address.push(CHARSET[usize::from(*value)] as char);
    }
    for i in 0..CHECKSUM_LEN {
        let value = (checksum >> (5 * (CHECKSUM_LEN - 1 - i))) & 0x1f;
        address.push(CHARSET[value as usize] as char);
    }
    Ok(address)
}

/// 解码并校验 CashAddr 地址，返回 (类型, 哈希)
///
/// 地址可以省略前缀，此时使用 `expected_prefix` 参与校验。
pub fn decode(address: &str, expected_prefix: &str) -> Result<(u8, Vec<u8>), AddressError> {
    let has_lower = address.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = address.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(AddressError::encoding("cashaddr: mixed case"));
    }
    let address = address.to_ascii_lowercase();

    let (prefix, data) = match address.split_once(':') {
        Some((prefix, data)) => (prefix, data),
        None => (expected_prefix, address.as_str()),
    };
    if prefix != expected_prefix {
        return Err(AddressError::encoding(format!(
            "cashaddr: unexpected prefix {:?}",
            prefix
        )));
    }

    let values = data
        .bytes()
        .map(|b| CHARSET.iter().position(|c| *c == b).map(|p| p as u8))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| AddressError::encoding("cashaddr: invalid character"))?;
    if values.len() <= CHECKSUM_LEN {
        return Err(AddressError::encoding("cashaddr: too short"));
    }
    if polymod(prefix_values(prefix).chain(values.iter().copied())) != 0 {
        return Err(AddressError::encoding("cashaddr: checksum mismatch"));
    }

    let payload = &values[..values.len() - CHECKSUM_LEN];
    let fes = payload
        .iter()
        .map(|v| Fe32::try_from(*v))
        .collect::<Result<Vec<Fe32>, _>>()
        .map_err(|e| AddressError::encoding(format!("cashaddr: {}", e)))?;
    let bytes: Vec<u8> = fes.into_iter().fes_to_bytes().collect();

    let (version, hash) = bytes
        .split_first()
        .ok_or_else(|| AddressError::encoding("cashaddr: empty payload"))?;
    if size_bits(hash.len()) != Some(version & 0x07) {
        return Err(AddressError::encoding("cashaddr: size mismatch"));
    }
    Ok((version >> 3, hash.to_vec()))
}
