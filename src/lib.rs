//! vultaddr - 从 `.vult` 金库派生只读多链地址
//!
//! 只使用根公钥与链码，不接触任何私钥分片，也不联网。

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use error::{AddressError, DerivationError, RegistryError, VaultError};

pub mod prelude {
    pub use crate::{
        config::Config,
        domain::{ChainId, ChainRegistry, VaultRecord},
        error::{AddressError, VaultError},
        infrastructure::curve::{CurveBackend, CurveBackendFactory, CurveBackendKind},
        infrastructure::encryption::KeyDerivation,
        service::{container_codec, AddressDerivationService, DerivationReport},
        utils::AddressValidator,
    };
}
