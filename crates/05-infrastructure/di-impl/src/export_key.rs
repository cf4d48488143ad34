//! 导出键
//!
//! 由导出声明派生的值类型，按字段做结构相等和哈希。

use di_abstractions::{ExportDeclaration, Keying};
use infrastructure_common::{SharePolicy, TypeInfo};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 导出键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExportKey {
    declaring_type: TypeInfo,
    exported_type: TypeInfo,
    policy: SharePolicy,
    keying: Keying,
}

impl ExportKey {
    /// 创建导出键
    pub fn new(
        declaring_type: TypeInfo,
        exported_type: TypeInfo,
        policy: SharePolicy,
        keying: Keying,
    ) -> Self {
        Self {
            declaring_type,
            exported_type,
            policy,
            keying,
        }
    }

    /// 从导出声明派生
    pub fn from_declaration(declaration: &ExportDeclaration) -> Self {
        Self::new(
            declaration.declaring_type(),
            declaration.exported_type(),
            declaration.policy(),
            declaration.keying(),
        )
    }

    /// 声明类型（实际构造的具体类型）
    pub fn declaring_type(&self) -> TypeInfo {
        self.declaring_type
    }

    /// 导出抽象类型
    pub fn exported_type(&self) -> TypeInfo {
        self.exported_type
    }

    /// 共享策略
    pub fn policy(&self) -> SharePolicy {
        self.policy
    }

    /// 键
    pub fn keying(&self) -> Keying {
        self.keying
    }

    /// 是否带键
    pub fn is_keyed(&self) -> bool {
        self.keying.is_keyed()
    }

    /// 键值，不带键时为 0
    pub fn key(&self) -> i32 {
        self.keying.key()
    }

    /// 身份哈希
    ///
    /// 只由键字段决定，同一进程内多次构建得到相同的值。
    pub fn identity_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for ExportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} as {} [{}",
            self.declaring_type.short_name(),
            self.exported_type.short_name(),
            self.policy
        )?;
        if let Keying::Keyed(key) = self.keying {
            write!(f, ", key={key}")?;
        }
        f.write_str("]")
    }
}
