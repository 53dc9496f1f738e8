//! secp256k1 曲线后端
//!
//! 派生器与编码器只依赖 `CurveBackend` trait，
//! 具体实现（纯 Rust 的 k256 或 libsecp256k1 绑定）由配置选择后注入。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use k256::elliptic_curve::group::Curve as _;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint};
use secp256k1::{Secp256k1, VerifyOnly};

use crate::error::CurveError;

/// 曲线运算接口
pub trait CurveBackend: Send + Sync {
    /// 后端名称
    fn name(&self) -> &'static str;

    /// 计算 K + tweak·G，返回压缩公钥
    fn tweak_add(&self, public_key: &[u8; 33], tweak: &[u8; 32]) -> Result<[u8; 33], CurveError>;

    /// 压缩公钥 → 未压缩公钥 (0x04 || X || Y)
    fn decompress(&self, public_key: &[u8; 33]) -> Result<[u8; 65], CurveError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// k256 (纯 Rust)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, Default)]
pub struct K256Backend;

impl K256Backend {
    fn parse(public_key: &[u8; 33]) -> Result<k256::PublicKey, CurveError> {
        k256::PublicKey::from_sec1_bytes(public_key)
            .map_err(|e| CurveError::InvalidPoint(format!("k256: {}", e)))
    }
}

impl CurveBackend for K256Backend {
    fn name(&self) -> &'static str {
        "k256"
    }

    fn tweak_add(&self, public_key: &[u8; 33], tweak: &[u8; 32]) -> Result<[u8; 33], CurveError> {
        let parent = Self::parse(public_key)?;

        // IL >= n 时 from_repr 返回 None
        let scalar: Option<k256::Scalar> = k256::Scalar::from_repr(FieldBytes::from(*tweak)).into();
        let scalar = scalar.ok_or(CurveError::TweakOutOfRange)?;

        let child = parent.to_projective() + ProjectivePoint::GENERATOR * scalar;
        let child = k256::PublicKey::from_affine(child.to_affine())
            .map_err(|_| CurveError::PointAtInfinity)?;

        child
            .to_encoded_point(true)
            .as_bytes()
            .try_into()
            .map_err(|_| CurveError::InvalidPoint("unexpected compressed length".to_string()))
    }

    fn decompress(&self, public_key: &[u8; 33]) -> Result<[u8; 65], CurveError> {
        Self::parse(public_key)?
            .to_encoded_point(false)
            .as_bytes()
            .try_into()
            .map_err(|_| CurveError::InvalidPoint("unexpected uncompressed length".to_string()))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// libsecp256k1
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct LibSecp256k1Backend {
    secp: Secp256k1<VerifyOnly>,
}

impl LibSecp256k1Backend {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }

    fn parse(public_key: &[u8; 33]) -> Result<secp256k1::PublicKey, CurveError> {
        secp256k1::PublicKey::from_slice(public_key)
            .map_err(|e| CurveError::InvalidPoint(format!("libsecp256k1: {}", e)))
    }
}

impl Default for LibSecp256k1Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LibSecp256k1Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LibSecp256k1Backend")
    }
}

impl CurveBackend for LibSecp256k1Backend {
    fn name(&self) -> &'static str {
        "libsecp256k1"
    }

    fn tweak_add(&self, public_key: &[u8; 33], tweak: &[u8; 32]) -> Result<[u8; 33], CurveError> {
        let parent = Self::parse(public_key)?;
        let scalar =
            secp256k1::Scalar::from_be_bytes(*tweak).map_err(|_| CurveError::TweakOutOfRange)?;
        let child = parent
            .add_exp_tweak(&self.secp, &scalar)
            .map_err(|_| CurveError::PointAtInfinity)?;
        Ok(child.serialize())
    }

    fn decompress(&self, public_key: &[u8; 33]) -> Result<[u8; 65], CurveError> {
        Ok(Self::parse(public_key)?.serialize_uncompressed())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 工厂
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 后端类型（配置项 CURVE_BACKEND）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveBackendKind {
    #[default]
    K256,
    LibSecp256k1,
}

impl FromStr for CurveBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "k256" => Ok(CurveBackendKind::K256),
            "secp256k1" | "libsecp256k1" => Ok(CurveBackendKind::LibSecp256k1),
            other => anyhow::bail!("Unknown curve backend: {} (expected k256 or secp256k1)", other),
        }
    }
}

/// 曲线后端工厂
pub struct CurveBackendFactory;

impl CurveBackendFactory {
    pub fn create(kind: CurveBackendKind) -> Arc<dyn CurveBackend> {
        match kind {
            CurveBackendKind::K256 => Arc::new(K256Backend),
            CurveBackendKind::LibSecp256k1 => Arc::new(LibSecp256k1Backend::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // secp256k1 生成元 G
    const G: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn generator() -> [u8; 33] {
        hex::decode(G).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_backends_agree() {
        let k256 = K256Backend;
        let libsecp = LibSecp256k1Backend::new();
        let tweak = [7u8; 32];

        let a = k256.tweak_add(&generator(), &tweak).unwrap();
        let b = libsecp.tweak_add(&generator(), &tweak).unwrap();
        assert_eq!(a, b);

        assert_eq!(
            k256.decompress(&generator()).unwrap(),
            libsecp.decompress(&generator()).unwrap()
        );
    }

    #[test]
    fn test_tweak_by_one_doubles_generator() {
        // G + 1·G = 2G
        let mut one = [0u8; 32];
        one[31] = 1;
        let doubled = K256Backend.tweak_add(&generator(), &one).unwrap();
        assert_eq!(
            hex::encode(doubled),
            "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"
        );
    }

    #[test]
    fn test_tweak_out_of_range() {
        // 曲线阶 n 本身不是合法标量
        let order: [u8; 32] =
            hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
                .unwrap()
                .try_into()
                .unwrap();

        assert_eq!(
            K256Backend.tweak_add(&generator(), &order),
            Err(CurveError::TweakOutOfRange)
        );
        assert_eq!(
            LibSecp256k1Backend::new().tweak_add(&generator(), &order),
            Err(CurveError::TweakOutOfRange)
        );
    }

    #[test]
    fn test_invalid_point() {
        let mut bogus = [0xffu8; 33];
        bogus[0] = 0x02;
        assert!(matches!(
            K256Backend.decompress(&bogus),
            Err(CurveError::InvalidPoint(_))
        ));
        assert!(matches!(
            LibSecp256k1Backend::new().decompress(&bogus),
            Err(CurveError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("k256".parse::<CurveBackendKind>().unwrap(), CurveBackendKind::K256);
        assert_eq!(
            "SECP256K1".parse::<CurveBackendKind>().unwrap(),
            CurveBackendKind::LibSecp256k1
        );
        assert!("openssl".parse::<CurveBackendKind>().is_err());
        assert_eq!(CurveBackendFactory::create(CurveBackendKind::K256).name(), "k256");
    }
}
