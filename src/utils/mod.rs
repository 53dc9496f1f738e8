pub mod address_validator;
pub mod cashaddr;
pub mod chain_normalizer;

pub use address_validator::AddressValidator;
pub use chain_normalizer::{normalize_chain_identifier, parse_chain_list};
