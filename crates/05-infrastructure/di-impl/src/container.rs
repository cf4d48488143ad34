//! 依赖注入容器实现
//!
//! 请求时自底向上惰性构造实例，按共享策略的重建规则复用或重建。

use crate::export::ExportRecord;
use crate::export_cache::ExportCache;
use crate::export_graph::ExportGraph;
use crate::export_key::ExportKey;
use crate::instance_cache::{InstanceCache, SlotKey};
use di_abstractions::{
    ComponentSource, ContainerConfig, ContainerStats, DiContainer, ExportedInstance, Instance,
    Keying,
};
use infrastructure_common::{IocError, IocResult, TypeInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// 依赖注入容器
#[derive(Debug)]
pub struct IocContainer {
    exports: Arc<ExportCache>,
    instances: InstanceCache,
    instances_built: AtomicUsize,
    cache_hits: AtomicUsize,
}

impl IocContainer {
    /// 使用默认配置从组件源创建容器
    pub fn new(sources: &[ComponentSource]) -> IocResult<Self> {
        Self::with_config(sources, &ContainerConfig::default())
    }

    /// 从组件源创建容器
    pub fn with_config(sources: &[ComponentSource], config: &ContainerConfig) -> IocResult<Self> {
        let exports = ExportGraph::build_cache(sources, config)?;
        Ok(Self::from_cache(Arc::new(exports)))
    }

    /// 使用已构建的导出缓存创建容器
    ///
    /// 多个容器可以共享同一个导出缓存，各自持有独立的实例缓存。
    pub fn from_cache(exports: Arc<ExportCache>) -> Self {
        Self {
            exports,
            instances: InstanceCache::new(),
            instances_built: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
        }
    }

    /// 创建容器构建器
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// 导出缓存
    pub fn export_cache(&self) -> &Arc<ExportCache> {
        &self.exports
    }

    /// 全部已解析的导出键
    pub fn exports(&self) -> Vec<ExportKey> {
        self.exports.exports().to_vec()
    }

    fn slot_key(&self, key: &ExportKey) -> SlotKey {
        match self.exports.shared_group(key) {
            Some(group) => SlotKey::Shared(Arc::clone(group)),
            None => SlotKey::Export(*key),
        }
    }

    /// 确保导出记录有可用实例
    ///
    /// `trail` 是本次请求中正在构造的实例槽。
    fn ensure_ready(&self, record: &ExportRecord, trail: &mut Vec<SlotKey>) -> IocResult<Instance> {
        let key = record.key();
        let slot_key = self.slot_key(key);
        if trail.contains(&slot_key) {
            let mut chain: Vec<String> = trail.iter().map(ToString::to_string).collect();
            chain.push(slot_key.to_string());
            return Err(IocError::CircularDependency {
                export: key.to_string(),
                chain,
            });
        }

        let slot = self.instances.slot(&slot_key);
        let mut guard = slot.lock();
        if let Some(instance) = guard.reusable(&slot_key, key.policy())? {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(instance);
        }

        trail.push(slot_key);
        let built = self.construct(record, trail);
        trail.pop();
        let instance = built?;

        guard.store(Arc::clone(&instance));
        self.instances_built.fetch_add(1, Ordering::Relaxed);
        debug!("已构造实例: {}", key);
        Ok(instance)
    }

    fn construct(&self, record: &ExportRecord, trail: &mut Vec<SlotKey>) -> IocResult<Instance> {
        let key = record.key();

        let mut arguments = Vec::with_capacity(record.dependencies().len());
        for dependency in record.dependencies() {
            let instance = self.ensure_ready(dependency, trail)?;
            arguments.push(dependency.upcast(instance)?);
        }

        if let Some(link) = self.exports.producer_link(key) {
            let factory_record = self
                .exports
                .record(link.factory())
                .cloned()
                .ok_or_else(|| IocError::export_consistency(link.factory(), "实例工厂没有导出记录"))?;
            let factory = self.ensure_ready(&factory_record, trail)?;
            return link.binding().invoke(factory_record.upcast(factory)?);
        }

        let factory = self
            .exports
            .instance_factory(key.declaring_type())
            .ok_or_else(|| IocError::export_consistency(key, "声明类型没有实例工厂"))?;
        factory.create(arguments)
    }

    fn locate(&self, exported_type: TypeInfo, keying: Keying) -> IocResult<(Arc<ExportRecord>, Instance)> {
        let record = self.exports.find_export(exported_type, keying)?;
        let instance = self.ensure_ready(&record, &mut Vec::new())?;
        Ok((record, instance))
    }
}

impl DiContainer for IocContainer {
    fn resolve(&self, exported_type: TypeInfo, keying: Keying) -> IocResult<ExportedInstance> {
        let (record, instance) = self.locate(exported_type, keying)?;
        record.upcast(instance)
    }

    fn get_by_type(&self, exported_type: TypeInfo) -> IocResult<Instance> {
        self.locate(exported_type, Keying::Unkeyed)
            .map(|(_, instance)| instance)
    }

    fn get_by_type_keyed(&self, exported_type: TypeInfo, key: i32) -> IocResult<Instance> {
        self.locate(exported_type, Keying::Keyed(key))
            .map(|(_, instance)| instance)
    }

    fn stats(&self) -> ContainerStats {
        ContainerStats {
            registered_exports: self.exports.exports().len(),
            shared_groups: self.exports.shared_group_count(),
            instance_slots: self.instances.len(),
            instances_built: self.instances_built.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

/// 容器构建器
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    sources: Vec<ComponentSource>,
    config: ContainerConfig,
}

impl ContainerBuilder {
    /// 创建空的容器构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加组件源
    pub fn add_source(mut self, source: ComponentSource) -> Self {
        self.sources.push(source);
        self
    }

    /// 设置容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 构建容器
    pub fn build(self) -> IocResult<IocContainer> {
        let container = IocContainer::with_config(&self.sources, &self.config)?;
        info!(
            "构建容器完成，注册了 {} 个导出",
            container.exports.exports().len()
        );
        Ok(container)
    }
}
