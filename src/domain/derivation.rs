//! BIP32 公钥派生
//!
//! 只持有根公钥与链码，因此只能做非强化派生 (CKDpub)。
//! 曲线运算通过 `CurveBackend` 注入，派生器本身不绑定具体实现。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::error::{CurveError, DerivationError};
use crate::infrastructure::curve::CurveBackend;

type HmacSha512 = Hmac<Sha512>;

/// 强化索引标志位
pub const HARDENED_BIT: u32 = 0x8000_0000;

/// 派生路径（数值索引序列）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn new(indices: Vec<u32>) -> Self {
        Self(indices)
    }

    /// 按 TSS 约定解析：去掉 `'` 后全部按非强化索引处理
    ///
    /// `m/84'/0'/0'/0/0` → `[84, 0, 0, 0, 0]`
    pub fn from_tss_notation(notation: &str) -> Result<Self, DerivationError> {
        let body = strip_root(notation)?;
        let mut indices = Vec::new();
        for component in body {
            let digits = component.trim_end_matches(['\'', 'h', 'H']);
            let index = digits.parse::<u32>().map_err(|_| {
                DerivationError::InvalidPath(format!(
                    "invalid component {:?} in {:?}",
                    component, notation
                ))
            })?;
            indices.push(index);
        }
        Ok(Self(indices))
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 第一个强化索引 (位置, 原始值)
    pub fn first_hardened(&self) -> Option<(usize, u32)> {
        self.0
            .iter()
            .enumerate()
            .find(|(_, index)| **index & HARDENED_BIT != 0)
            .map(|(position, index)| (position, *index))
    }
}

/// 严格 BIP32 写法：`'` / `h` 会设置强化位
impl FromStr for DerivationPath {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_root(s)?;
        let mut indices = Vec::new();
        for component in body {
            let (digits, hardened) = match component.strip_suffix(['\'', 'h', 'H']) {
                Some(digits) => (digits, true),
                None => (component, false),
            };
            let index = digits
                .parse::<u32>()
                .ok()
                .filter(|i| i & HARDENED_BIT == 0)
                .ok_or_else(|| {
                    DerivationError::InvalidPath(format!(
                        "invalid component {:?} in {:?}",
                        component, s
                    ))
                })?;
            indices.push(if hardened { index | HARDENED_BIT } else { index });
        }
        Ok(Self(indices))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in &self.0 {
            if index & HARDENED_BIT != 0 {
                write!(f, "/{}'", index & !HARDENED_BIT)?;
            } else {
                write!(f, "/{}", index)?;
            }
        }
        Ok(())
    }
}

fn strip_root(notation: &str) -> Result<impl Iterator<Item = &str>, DerivationError> {
    let notation = notation.trim();
    let rest = notation
        .strip_prefix('m')
        .ok_or_else(|| DerivationError::InvalidPath(format!("path must start with 'm': {:?}", notation)))?;
    let rest = match rest {
        "" | "/" => "",
        _ => rest.strip_prefix('/').ok_or_else(|| {
            DerivationError::InvalidPath(format!("expected '/' after 'm': {:?}", notation))
        })?,
    };
    Ok(rest.split('/').filter(|c| !c.is_empty()))
}

/// 扩展公钥（压缩公钥 + 链码）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    pub public_key: [u8; 33],
    pub chain_code: [u8; 32],
}

/// 公钥派生器
#[derive(Clone)]
pub struct PublicKeyDeriver {
    curve: Arc<dyn CurveBackend>,
}

impl PublicKeyDeriver {
    pub fn new(curve: Arc<dyn CurveBackend>) -> Self {
        Self { curve }
    }

    pub fn backend_name(&self) -> &'static str {
        self.curve.name()
    }

    /// 沿路径派生子公钥
    ///
    /// 路径中任何强化索引都会在第一次曲线运算之前被拒绝。
    pub fn derive_child_public_key(
        &self,
        public_key: &[u8; 33],
        chain_code: &[u8; 32],
        path: &[u32],
    ) -> Result<ExtendedPublicKey, DerivationError> {
        if let Some(position) = path.iter().position(|i| i & HARDENED_BIT != 0) {
            return Err(DerivationError::HardenedDerivationUnsupported {
                index: path[position],
                position,
            });
        }

        if !matches!(public_key[0], 0x02 | 0x03) {
            return Err(DerivationError::InvalidPublicKey(format!(
                "unexpected SEC1 prefix {:#04x}",
                public_key[0]
            )));
        }

        let mut current = ExtendedPublicKey {
            public_key: *public_key,
            chain_code: *chain_code,
        };
        for &index in path {
            current = self.ckd_pub(&current, index)?;
        }
        Ok(current)
    }

    /// 按 `DerivationPath` 派生
    pub fn derive_path(
        &self,
        root: &ExtendedPublicKey,
        path: &DerivationPath,
    ) -> Result<ExtendedPublicKey, DerivationError> {
        self.derive_child_public_key(&root.public_key, &root.chain_code, path.indices())
    }

    /// CKDpub：I = HMAC-SHA512(c, K || ser32(i))，K' = K + IL·G，c' = IR
    fn ckd_pub(
        &self,
        parent: &ExtendedPublicKey,
        index: u32,
    ) -> Result<ExtendedPublicKey, DerivationError> {
        let mut mac = HmacSha512::new_from_slice(&parent.chain_code)
            .map_err(|_| DerivationError::InvalidChildKey { index })?;
        mac.update(&parent.public_key);
        mac.update(&index.to_be_bytes());
        let i = mac.finalize().into_bytes();

        let mut tweak = [0u8; 32];
        let mut chain_code = [0u8; 32];
        tweak.copy_from_slice(&i[..32]);
        chain_code.copy_from_slice(&i[32..]);

        let public_key = self
            .curve
            .tweak_add(&parent.public_key, &tweak)
            .map_err(|e| match e {
                CurveError::InvalidPoint(msg) => DerivationError::InvalidPublicKey(msg),
                CurveError::TweakOutOfRange | CurveError::PointAtInfinity => {
                    DerivationError::InvalidChildKey { index }
                }
            })?;

        Ok(ExtendedPublicKey {
            public_key,
            chain_code,
        })
    }
}

impl fmt::Debug for PublicKeyDeriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyDeriver")
            .field("curve", &self.curve.name())
            .finish()
    }
}
