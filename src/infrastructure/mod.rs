pub mod curve;
pub mod encryption;
pub mod logging;
pub mod password;
pub mod pbkdf2;
pub mod proto;
