//! 导出图解析
//!
//! 启动时扫描全部组件源，建立导出之间的依赖关系，校验共享策略并检测循环依赖，
//! 最终生成不可变的 [`ExportCache`]。

use crate::export::ExportRecord;
use crate::export_cache::ExportCache;
use crate::export_key::ExportKey;
use crate::instance_factory::{InstanceFactory, ProducerBinding};
use crate::shared_key::SharedGroupKey;
use di_abstractions::{
    ComponentSource, ConstructorInfo, ContainerConfig, ExportDeclaration, Keying,
};
use infrastructure_common::{IocError, IocResult, SharePolicy, TypeInfo};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 导出图构建器
pub struct ExportGraph<'a> {
    config: &'a ContainerConfig,
    constructors: HashMap<TypeInfo, &'a [ConstructorInfo]>,
    declarations: HashMap<ExportKey, &'a ExportDeclaration>,
    producers: Vec<&'a ExportDeclaration>,
    groups: HashMap<ExportKey, Arc<SharedGroupKey>>,
    path: Vec<ExportKey>,
    cache: ExportCache,
}

impl<'a> ExportGraph<'a> {
    /// 从组件源构建导出缓存
    ///
    /// 结构不一致（共享策略混用、依赖缺失或重复、循环依赖）时失败。
    pub fn build_cache(sources: &'a [ComponentSource], config: &'a ContainerConfig) -> IocResult<ExportCache> {
        config.validate()?;
        info!("开始构建导出图，组件源数量: {}", sources.len());

        let mut graph = Self::scan(sources, config)?;
        let keys = graph.cache_keys();
        graph.partition(&keys)?;

        for key in &keys {
            if graph.cache.contains(key) {
                continue;
            }
            let record = graph.resolve_export(*key, &mut Vec::new())?;
            graph.cache_export(record)?;
        }

        graph.link_producers()?;

        info!(
            "导出图构建完成: {} 个导出, {} 个共享组",
            graph.cache.exports().len(),
            graph.cache.shared_group_count()
        );
        Ok(graph.cache)
    }

    /// 扫描组件源，登记构造函数和导出声明
    fn scan(sources: &'a [ComponentSource], config: &'a ContainerConfig) -> IocResult<Self> {
        let mut names = HashSet::new();
        let mut constructors: HashMap<TypeInfo, &'a [ConstructorInfo]> = HashMap::new();
        let mut declarations: HashMap<ExportKey, &'a ExportDeclaration> = HashMap::new();
        let mut producers = Vec::new();
        let mut declared = Vec::new();

        for source in sources {
            source.validate()?;
            if !names.insert(source.name()) {
                return Err(IocError::initialization(format!(
                    "组件源重复: {}",
                    source.name()
                )));
            }
            debug!("扫描组件源: {}", source.name());

            for component in source.components() {
                let component_type = component.component_type();
                if !component.constructors().is_empty() {
                    if constructors.contains_key(&component_type) {
                        warn!("构造函数已登记，忽略重复登记: {}", component_type);
                    } else {
                        constructors.insert(component_type, component.constructors());
                    }
                }

                for declaration in component.exports() {
                    let key = ExportKey::from_declaration(declaration);
                    if config.log_resolution {
                        debug!("发现导出声明: {}", key);
                    }
                    declarations.entry(key).or_insert(declaration);
                    if declaration.producer().is_some() {
                        producers.push(declaration);
                    }
                    declared.push(key);
                }
            }
        }

        info!("扫描完成，导出声明数量: {}", declared.len());
        Ok(Self {
            config,
            constructors,
            declarations,
            producers,
            groups: HashMap::new(),
            path: Vec::new(),
            cache: ExportCache::new(declared),
        })
    }

    /// 去重后的导出键（声明顺序）
    fn cache_keys(&self) -> Vec<ExportKey> {
        let mut keys: Vec<ExportKey> = Vec::new();
        for key in self.cache.declared() {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
        keys
    }

    /// 按声明类型划分导出键并建立共享组
    fn partition(&mut self, keys: &[ExportKey]) -> IocResult<()> {
        let mut partitions: Vec<(TypeInfo, Vec<ExportKey>)> = Vec::new();
        for key in keys {
            match partitions
                .iter_mut()
                .find(|(declaring_type, _)| *declaring_type == key.declaring_type())
            {
                Some((_, members)) => members.push(*key),
                None => partitions.push((key.declaring_type(), vec![*key])),
            }
        }

        for (declaring_type, members) in partitions {
            let Some(first) = members.first().copied() else {
                continue;
            };

            let group = if members.iter().any(|k| k.policy() == SharePolicy::ShareGlobal) {
                if let Some(other) = members.iter().find(|k| k.policy() != SharePolicy::ShareGlobal) {
                    return Err(IocError::initialization(format!(
                        "{declaring_type} 的导出混用了 ShareGlobal 和其他共享策略: {other}"
                    )));
                }
                Some(SharedGroupKey::new(
                    declaring_type,
                    SharePolicy::ShareGlobal,
                    members.iter().copied(),
                )?)
            } else if members
                .iter()
                .any(|k| k.policy() == SharePolicy::ShareExportedType)
                && first.policy() == SharePolicy::ShareExportedType
            {
                Some(SharedGroupKey::new(
                    declaring_type,
                    SharePolicy::ShareExportedType,
                    members.iter().copied().filter(|k| k.policy() == first.policy()),
                )?)
            } else {
                None
            };

            if let Some(group) = group {
                if self.config.log_resolution {
                    debug!("建立共享组: {}", group);
                }
                let group = Arc::new(group);
                for member in group.members() {
                    self.groups.insert(*member, Arc::clone(&group));
                }
            }
        }
        Ok(())
    }

    /// 递归解析导出键的依赖
    ///
    /// `history` 只包含当前解析链：每个新依赖以请求方为起点开启新的链。
    fn resolve_export(&mut self, key: ExportKey, history: &mut Vec<ExportKey>) -> IocResult<Arc<ExportRecord>> {
        history.push(key);
        if let Some(record) = self.cache.record(&key) {
            return Ok(Arc::clone(record));
        }

        if self.path.contains(&key) {
            let mut chain: Vec<String> = self.path.iter().map(ToString::to_string).collect();
            chain.push(key.to_string());
            return Err(IocError::CircularDependency {
                export: key.to_string(),
                chain,
            });
        }
        if self.path.len() >= self.config.max_resolution_depth {
            return Err(IocError::initialization(format!(
                "解析深度超过上限 {}: {}",
                self.config.max_resolution_depth, key
            )));
        }

        self.path.push(key);
        let result = self.resolve_dependencies(key, history.as_slice());
        self.path.pop();
        result
    }

    fn resolve_dependencies(&mut self, key: ExportKey, history: &[ExportKey]) -> IocResult<Arc<ExportRecord>> {
        let declaration = *self
            .declarations
            .get(&key)
            .ok_or_else(|| IocError::export_consistency(key, "导出键没有对应的导出声明"))?;
        let upcast = Arc::clone(declaration.upcast());

        if declaration.producer().is_some() {
            if self.config.log_resolution {
                debug!("导出由实例工厂构造，不解析构造函数: {}", key);
            }
            return Ok(Arc::new(ExportRecord::new(key, Vec::new(), upcast)));
        }

        let factory = self.instance_factory(key.declaring_type())?;
        let mut dependencies = Vec::with_capacity(factory.parameters().len());

        for parameter in factory.parameters() {
            let found = match parameter.import_marker() {
                Some(marker) => self
                    .cache
                    .find_key(marker.exported_type, Keying::Keyed(marker.key)),
                None => self.cache.find_key_by_type(parameter.parameter_type()),
            };
            let dependency = found.map_err(|e| match e {
                IocError::FailedDependency { type_name, message } => IocError::failed_dependency(
                    type_name,
                    format!("{message}, 依赖方: {key}"),
                ),
                other => other,
            })?;

            if history.contains(&dependency) {
                let mut chain: Vec<String> = history.iter().map(ToString::to_string).collect();
                chain.push(dependency.to_string());
                return Err(IocError::CircularDependency {
                    export: dependency.to_string(),
                    chain,
                });
            }

            let cached = self.cache.record(&dependency).cloned();
            let record = match cached {
                Some(record) => record,
                None => {
                    let record = self.resolve_export(dependency, &mut vec![key])?;
                    self.cache_export(Arc::clone(&record))?;
                    record
                }
            };
            if self.config.log_resolution {
                debug!("{} 依赖 {}", key, record.key());
            }
            dependencies.push(record);
        }

        Ok(Arc::new(ExportRecord::new(key, dependencies, upcast)))
    }

    /// 取得声明类型的实例工厂，首次使用时选定构造函数
    fn instance_factory(&mut self, declaring_type: TypeInfo) -> IocResult<Arc<InstanceFactory>> {
        if let Some(factory) = self.cache.instance_factory(declaring_type) {
            return Ok(Arc::clone(factory));
        }
        let constructors = self.constructors.get(&declaring_type).copied().unwrap_or_default();
        let factory = Arc::new(InstanceFactory::for_type(declaring_type, constructors)?);
        self.cache.insert_factory(Arc::clone(&factory));
        Ok(factory)
    }

    fn cache_export(&mut self, record: Arc<ExportRecord>) -> IocResult<()> {
        let group = self.groups.get(record.key()).cloned();
        self.cache.insert(record, group)
    }

    /// 关联实例工厂，并检查产品不会经由工厂回到自身
    fn link_producers(&mut self) -> IocResult<()> {
        for declaration in &self.producers {
            let Some(producer) = declaration.producer() else {
                continue;
            };
            let product = ExportKey::from_declaration(declaration);
            let factory = self
                .cache
                .find_key(producer.factory_type(), producer.selector())
                .map_err(|e| match e {
                    IocError::FailedDependency { type_name, message } => IocError::failed_dependency(
                        type_name,
                        format!("{message}, 产品: {product}"),
                    ),
                    other => other,
                })?;

            debug!("关联实例工厂: {} <- {}", product, factory);
            self.cache.link_producer(
                product,
                factory,
                ProducerBinding::bind(product.declaring_type(), producer),
            );
        }

        for declaration in &self.producers {
            let product = ExportKey::from_declaration(declaration);
            if let Some(chain) = self.producer_cycle(product) {
                return Err(IocError::CircularDependency {
                    export: product.to_string(),
                    chain: chain.iter().map(ToString::to_string).collect(),
                });
            }
        }
        Ok(())
    }

    /// 从产品出发沿依赖记录和工厂关联搜索，回到产品的实例槽即构成环
    fn producer_cycle(&self, product: ExportKey) -> Option<Vec<ExportKey>> {
        let mut visited = HashSet::new();
        let mut pending = vec![vec![product]];
        while let Some(trail) = pending.pop() {
            let Some(current) = trail.last().copied() else {
                continue;
            };
            for next in self.successors(&current) {
                let mut extended = trail.clone();
                extended.push(next);
                if self.same_slot(&next, &product) {
                    return Some(extended);
                }
                if visited.insert(next) {
                    pending.push(extended);
                }
            }
        }
        None
    }

    fn successors(&self, key: &ExportKey) -> Vec<ExportKey> {
        let mut next: Vec<ExportKey> = self
            .cache
            .record(key)
            .map(|record| record.dependencies().iter().map(|d| *d.key()).collect())
            .unwrap_or_default();
        if let Some(link) = self.cache.producer_link(key) {
            next.push(*link.factory());
        }
        next
    }

    /// 两个导出键是否使用同一个实例槽
    fn same_slot(&self, a: &ExportKey, b: &ExportKey) -> bool {
        if a == b {
            return true;
        }
        match (self.cache.shared_group(a), self.cache.shared_group(b)) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}
