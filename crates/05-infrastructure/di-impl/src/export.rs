//! 导出记录

use crate::export_key::ExportKey;
use di_abstractions::{ExportedInstance, Instance, UpcastFn};
use infrastructure_common::{IocError, IocResult};
use std::fmt;
use std::sync::Arc;

/// 导出记录
///
/// 每个唯一导出键一条，依赖记录按构造函数参数顺序排列并在记录之间共享。
#[derive(Clone)]
pub struct ExportRecord {
    key: ExportKey,
    dependencies: Vec<Arc<ExportRecord>>,
    upcast: UpcastFn,
}

impl ExportRecord {
    /// 创建导出记录
    pub fn new(key: ExportKey, dependencies: Vec<Arc<ExportRecord>>, upcast: UpcastFn) -> Self {
        Self {
            key,
            dependencies,
            upcast,
        }
    }

    /// 导出键
    pub fn key(&self) -> &ExportKey {
        &self.key
    }

    /// 依赖记录（参数顺序）
    pub fn dependencies(&self) -> &[Arc<ExportRecord>] {
        &self.dependencies
    }

    /// 把声明类型的实例转换为导出抽象
    pub fn upcast(&self, instance: Instance) -> IocResult<ExportedInstance> {
        (self.upcast)(instance).ok_or_else(|| {
            IocError::export_consistency(
                self.key,
                format!("实例不是声明类型 {}", self.key.declaring_type()),
            )
        })
    }
}

impl fmt::Debug for ExportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportRecord")
            .field("key", &self.key)
            .field(
                "dependencies",
                &self.dependencies.iter().map(|d| d.key).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
