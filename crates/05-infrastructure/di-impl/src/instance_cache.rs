//! 实例缓存
//!
//! 每个实例槽由自己的互斥锁保护，构造时只持有当前槽的锁。

use crate::export_key::ExportKey;
use crate::shared_key::SharedGroupKey;
use dashmap::DashMap;
use di_abstractions::Instance;
use infrastructure_common::{IocError, IocResult, SharePolicy};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// 实例槽键
///
/// 共享导出使用所属共享组，非共享导出使用导出键本身。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// 非共享导出的实例槽
    Export(ExportKey),
    /// 共享组的实例槽
    Shared(Arc<SharedGroupKey>),
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Export(key) => fmt::Display::fmt(key, f),
            Self::Shared(group) => fmt::Display::fmt(group, f),
        }
    }
}

/// 实例槽
#[derive(Debug, Default)]
pub struct InstanceSlot {
    instance: Option<Instance>,
    ready: bool,
}

impl InstanceSlot {
    /// 当前实例
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// 是否已就绪
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// 重建规则：共享策略只在未就绪时重建，非共享每次都重建
    pub fn needs_rebuild(&self, policy: SharePolicy) -> bool {
        match policy {
            SharePolicy::ShareGlobal | SharePolicy::ShareExportedType => !self.ready,
            SharePolicy::NonShared => true,
        }
    }

    /// 可复用的实例，需要重建时返回 `None`
    pub fn reusable(&self, key: &SlotKey, policy: SharePolicy) -> IocResult<Option<Instance>> {
        if self.needs_rebuild(policy) {
            return Ok(None);
        }
        self.instance
            .clone()
            .map(Some)
            .ok_or_else(|| IocError::export_consistency(key, "实例槽已就绪但没有实例"))
    }

    /// 保存实例并标记就绪
    pub fn store(&mut self, instance: Instance) {
        self.instance = Some(instance);
        self.ready = true;
    }
}

/// 实例缓存
#[derive(Debug, Default)]
pub struct InstanceCache {
    slots: DashMap<SlotKey, Arc<Mutex<InstanceSlot>>>,
}

impl InstanceCache {
    /// 创建空的实例缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得实例槽，不存在时创建空槽
    pub fn slot(&self, key: &SlotKey) -> Arc<Mutex<InstanceSlot>> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(key.clone()).or_default().value())
    }

    /// 实例槽数量
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// 是否没有实例槽
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
