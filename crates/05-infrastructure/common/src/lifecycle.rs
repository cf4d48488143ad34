//! 导出实例的生命周期管理

use serde::{Deserialize, Serialize};
use std::fmt;

/// 导出实例的共享策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SharePolicy {
    /// 每个声明类型一个实例，在它的所有导出抽象之间共享，存活至进程结束
    #[default]
    ShareGlobal,
    /// 选择加入同一共享组的导出共享一个实例
    ShareExportedType,
    /// 每次请求都创建新实例
    NonShared,
}

impl SharePolicy {
    /// 是否为共享策略
    pub fn is_shared(self) -> bool {
        !matches!(self, Self::NonShared)
    }
}

impl fmt::Display for SharePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ShareGlobal => "ShareGlobal",
            Self::ShareExportedType => "ShareExportedType",
            Self::NonShared => "NonShared",
        };
        f.write_str(name)
    }
}
