//! 导出缓存
//!
//! 导出图构建完成后不可变，由容器通过 `Arc` 共享。

use crate::export::ExportRecord;
use crate::export_key::ExportKey;
use crate::instance_factory::{InstanceFactory, ProducerBinding};
use crate::shared_key::SharedGroupKey;
use di_abstractions::Keying;
use infrastructure_common::{IocError, IocResult, TypeInfo};
use std::collections::HashMap;
use std::sync::Arc;

/// 实例工厂关联：产品导出 -> 工厂导出
#[derive(Debug, Clone)]
pub struct ProducerLink {
    factory: ExportKey,
    binding: ProducerBinding,
}

impl ProducerLink {
    /// 工厂的导出键
    pub fn factory(&self) -> &ExportKey {
        &self.factory
    }

    /// 工厂调用绑定
    pub fn binding(&self) -> &ProducerBinding {
        &self.binding
    }
}

/// 导出缓存
#[derive(Debug, Default)]
pub struct ExportCache {
    declared: Vec<ExportKey>,
    records: HashMap<ExportKey, Arc<ExportRecord>>,
    order: Vec<ExportKey>,
    shared_groups: HashMap<ExportKey, Arc<SharedGroupKey>>,
    producer_links: HashMap<ExportKey, ProducerLink>,
    factories: HashMap<TypeInfo, Arc<InstanceFactory>>,
}

impl ExportCache {
    /// 以声明的全部导出键（保留重复）创建空缓存
    pub(crate) fn new(declared: Vec<ExportKey>) -> Self {
        Self {
            declared,
            ..Self::default()
        }
    }

    /// 声明的全部导出键（包含重复声明）
    pub(crate) fn declared(&self) -> &[ExportKey] {
        &self.declared
    }

    /// 按导出类型和键查找唯一的导出键
    ///
    /// 不带键时只匹配不带键的导出。
    pub fn find_key(&self, exported_type: TypeInfo, keying: Keying) -> IocResult<ExportKey> {
        self.unique(exported_type, |key| {
            key.exported_type() == exported_type && key.keying() == keying
        })
    }

    /// 按导出类型查找唯一的导出键，忽略键
    pub fn find_key_by_type(&self, exported_type: TypeInfo) -> IocResult<ExportKey> {
        self.unique(exported_type, |key| key.exported_type() == exported_type)
    }

    fn unique(&self, exported_type: TypeInfo, matches: impl Fn(&ExportKey) -> bool) -> IocResult<ExportKey> {
        let candidates: Vec<&ExportKey> = self.declared.iter().filter(|key| matches(key)).collect();
        match candidates.as_slice() {
            [key] => Ok(**key),
            [] => Err(IocError::failed_dependency(
                exported_type.name(),
                "没有匹配的导出",
            )),
            _ => Err(IocError::DuplicateExport {
                type_name: exported_type.name().to_string(),
                candidates: candidates.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    /// 按导出类型和键查找导出记录
    pub fn find_export(&self, exported_type: TypeInfo, keying: Keying) -> IocResult<Arc<ExportRecord>> {
        let key = self.find_key(exported_type, keying)?;
        self.record(&key)
            .cloned()
            .ok_or_else(|| IocError::export_consistency(key, "导出键已声明但没有导出记录"))
    }

    /// 导出记录
    pub fn record(&self, key: &ExportKey) -> Option<&Arc<ExportRecord>> {
        self.records.get(key)
    }

    /// 是否已有导出记录
    pub fn contains(&self, key: &ExportKey) -> bool {
        self.records.contains_key(key)
    }

    /// 导出键所属的共享组
    pub fn shared_group(&self, key: &ExportKey) -> Option<&Arc<SharedGroupKey>> {
        self.shared_groups.get(key)
    }

    /// 导出键的实例工厂关联
    pub fn producer_link(&self, key: &ExportKey) -> Option<&ProducerLink> {
        self.producer_links.get(key)
    }

    /// 声明类型的实例工厂
    pub fn instance_factory(&self, declaring_type: TypeInfo) -> Option<&Arc<InstanceFactory>> {
        self.factories.get(&declaring_type)
    }

    /// 全部导出键（解析顺序）
    pub fn exports(&self) -> &[ExportKey] {
        &self.order
    }

    /// 声明的导出数量（包含重复声明）
    pub fn declared_count(&self) -> usize {
        self.declared.len()
    }

    /// 共享组数量
    pub fn shared_group_count(&self) -> usize {
        let mut groups: Vec<&Arc<SharedGroupKey>> = Vec::new();
        for group in self.shared_groups.values() {
            if !groups.iter().any(|g| Arc::ptr_eq(g, group)) {
                groups.push(group);
            }
        }
        groups.len()
    }

    /// 插入导出记录，共享策略必须提供共享组
    pub(crate) fn insert(
        &mut self,
        record: Arc<ExportRecord>,
        group: Option<Arc<SharedGroupKey>>,
    ) -> IocResult<()> {
        let key = *record.key();
        if self.records.contains_key(&key) {
            return Ok(());
        }

        if key.policy().is_shared() {
            let group = group.ok_or_else(|| {
                IocError::initialization(format!("缺少共享组: {key}"))
            })?;
            self.shared_groups.insert(key, group);
        }
        self.records.insert(key, record);
        self.order.push(key);
        Ok(())
    }

    pub(crate) fn insert_factory(&mut self, factory: Arc<InstanceFactory>) {
        self.factories
            .entry(factory.declaring_type())
            .or_insert(factory);
    }

    pub(crate) fn link_producer(&mut self, product: ExportKey, factory: ExportKey, binding: ProducerBinding) {
        self.producer_links
            .entry(product)
            .or_insert(ProducerLink { factory, binding });
    }
}
