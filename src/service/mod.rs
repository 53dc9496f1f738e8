pub mod address_derivation;
pub mod container_codec;
pub mod vault_record_codec;

pub use address_derivation::{AddressDerivationService, DerivationReport};
