//! 密码包装器
//! 容器密码只在内存中短暂存在，释放时清零

use std::fmt;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 密码包装器（使用Zeroize保护）
#[derive(Clone, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_debug_redacted() {
        let password = Password::new("correct horse".into());
        assert_eq!(format!("{:?}", password), "Password(***)");
        assert_eq!(password.as_str(), "correct horse");
    }

    #[test]
    fn test_password_zeroize() {
        let mut password = Password::new("secret".into());
        password.zeroize();
        assert!(password.is_empty());
    }
}
