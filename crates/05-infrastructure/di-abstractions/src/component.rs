//! 组件描述符与组件源
//!
//! 每个组件类型通过 [`ComponentBuilder`] 登记构造函数和导出声明，
//! 再按名称归入 [`ComponentSource`]，作为容器启动时的输入。

use crate::constructor::{Arguments, ConstructorFn, ConstructorInfo, ParameterInfo};
use crate::declaration::{ExportDeclaration, Keying, ProducerDeclaration, UpcastFn};
use crate::factory::{producer_fn, InstanceProducer};
use crate::instance::{ExportedInstance, Instance};
use infrastructure_common::{BoxError, IocError, IocResult, SharePolicy, TypeInfo};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

fn upcast_with<T, I, U>(upcast: U) -> UpcastFn
where
    T: Send + Sync + 'static,
    I: ?Sized + Send + Sync + 'static,
    U: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
{
    Arc::new(move |instance: Instance| {
        instance
            .downcast::<T>()
            .ok()
            .map(|concrete| ExportedInstance::new(upcast(concrete)))
    })
}

/// 单个导出声明的构建器
///
/// ```ignore
/// ExportBuilder::<SqlRepo>::of(|repo| repo as Arc<dyn Repo>)
///     .keyed(1)
///     .policy(SharePolicy::ShareExportedType)
///     .produced_by::<dyn InstanceProducer<SqlRepo>>();
/// ```
pub struct ExportBuilder<T> {
    exported_type: TypeInfo,
    policy: SharePolicy,
    keying: Keying,
    producer: Option<ProducerDeclaration>,
    upcast: UpcastFn,
    component_type: PhantomData<fn() -> T>,
}

impl<T> ExportBuilder<T>
where
    T: Send + Sync + 'static,
{
    /// 以声明类型本身导出
    pub fn of_self() -> Self {
        Self::of(|instance: Arc<T>| instance)
    }

    /// 以抽象类型 `I` 导出
    pub fn of<I, U>(upcast: U) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        U: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        Self {
            exported_type: TypeInfo::of::<I>(),
            policy: SharePolicy::default(),
            keying: Keying::Unkeyed,
            producer: None,
            upcast: upcast_with::<T, I, U>(upcast),
            component_type: PhantomData,
        }
    }

    /// 设置导出键
    pub fn keyed(mut self, key: i32) -> Self {
        self.keying = Keying::Keyed(key);
        self
    }

    /// 设置共享策略
    pub fn policy(mut self, policy: SharePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 由导出为 `P` 的不带键工厂生产实例
    pub fn produced_by<P>(self) -> Self
    where
        P: ?Sized + InstanceProducer<T> + Send + Sync + 'static,
    {
        self.produced_by_selector::<P>(Keying::Unkeyed)
    }

    /// 由导出为 `P`、键为 `key` 的工厂生产实例
    pub fn produced_by_keyed<P>(self, key: i32) -> Self
    where
        P: ?Sized + InstanceProducer<T> + Send + Sync + 'static,
    {
        self.produced_by_selector::<P>(Keying::Keyed(key))
    }

    fn produced_by_selector<P>(mut self, selector: Keying) -> Self
    where
        P: ?Sized + InstanceProducer<T> + Send + Sync + 'static,
    {
        self.producer = Some(ProducerDeclaration::new(
            TypeInfo::of::<P>(),
            selector,
            producer_fn::<T, P>(),
        ));
        self
    }

    /// 生成导出声明
    pub fn build(self) -> ExportDeclaration {
        let declaration = ExportDeclaration::new(
            TypeInfo::of::<T>(),
            self.exported_type,
            self.policy,
            self.keying,
            self.upcast,
        );
        match self.producer {
            Some(producer) => declaration.with_producer(producer),
            None => declaration,
        }
    }
}

/// 组件描述符构建器
pub struct ComponentBuilder<T> {
    constructors: Vec<ConstructorInfo>,
    exports: Vec<ExportDeclaration>,
    component_type: PhantomData<fn() -> T>,
}

impl<T> ComponentBuilder<T>
where
    T: Send + Sync + 'static,
{
    /// 创建空的组件构建器
    pub fn new() -> Self {
        Self {
            constructors: Vec::new(),
            exports: Vec::new(),
            component_type: PhantomData,
        }
    }

    /// 登记导入构造函数
    ///
    /// `parameters` 的顺序即构造函数读取 [`Arguments`] 的顺序。
    pub fn importing_constructor<F>(mut self, parameters: Vec<ParameterInfo>, constructor: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let invoke: ConstructorFn = Arc::new(move |arguments: &mut Arguments| -> Result<Instance, BoxError> {
            Ok(Arc::new(constructor(arguments)?) as Instance)
        });
        self.constructors.push(ConstructorInfo::importing(parameters, invoke));
        self
    }

    /// 登记无参构造函数
    pub fn parameterless<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let invoke: ConstructorFn = Arc::new(move |_: &mut Arguments| -> Result<Instance, BoxError> {
            Ok(Arc::new(constructor()?) as Instance)
        });
        self.constructors.push(ConstructorInfo::parameterless(invoke));
        self
    }

    /// 以 `Default` 作为无参构造函数
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.parameterless(|| Ok(T::default()))
    }

    /// 以声明类型本身导出
    pub fn export_self(self, policy: SharePolicy) -> Self {
        self.export(ExportBuilder::of_self().policy(policy))
    }

    /// 以抽象类型 `I` 导出
    pub fn export_as<I, U>(self, upcast: U, policy: SharePolicy) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        U: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        self.export(ExportBuilder::of(upcast).policy(policy))
    }

    /// 以抽象类型 `I` 和键 `key` 导出
    pub fn export_keyed<I, U>(self, upcast: U, key: i32, policy: SharePolicy) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        U: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        self.export(ExportBuilder::of(upcast).keyed(key).policy(policy))
    }

    /// 添加导出声明
    pub fn export(mut self, export: ExportBuilder<T>) -> Self {
        self.exports.push(export.build());
        self
    }

    /// 生成组件描述符
    pub fn build(self) -> ComponentDescriptor {
        ComponentDescriptor {
            component_type: TypeInfo::of::<T>(),
            constructors: self.constructors,
            exports: self.exports,
        }
    }
}

impl<T> Default for ComponentBuilder<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// 组件描述符
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    component_type: TypeInfo,
    constructors: Vec<ConstructorInfo>,
    exports: Vec<ExportDeclaration>,
}

impl ComponentDescriptor {
    /// 组件类型
    pub fn component_type(&self) -> TypeInfo {
        self.component_type
    }

    /// 已登记的构造函数
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    /// 导出声明
    pub fn exports(&self) -> &[ExportDeclaration] {
        &self.exports
    }
}

impl<T> From<ComponentBuilder<T>> for ComponentDescriptor
where
    T: Send + Sync + 'static,
{
    fn from(builder: ComponentBuilder<T>) -> Self {
        builder.build()
    }
}

/// 组件源
///
/// 一组按名称归类的组件描述符，容器启动时扫描其中的全部导出声明。
#[derive(Debug, Clone)]
pub struct ComponentSource {
    name: String,
    components: Vec<ComponentDescriptor>,
}

impl ComponentSource {
    /// 创建指定名称的空组件源
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// 添加组件
    pub fn with_component(mut self, component: impl Into<ComponentDescriptor>) -> Self {
        self.add_component(component);
        self
    }

    /// 添加组件
    pub fn add_component(&mut self, component: impl Into<ComponentDescriptor>) {
        let component = component.into();
        trace!(
            "组件源 {} 添加组件: {} ({} 个导出)",
            self.name,
            component.component_type(),
            component.exports().len()
        );
        self.components.push(component);
    }

    /// 组件源名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 组件描述符（注册顺序）
    pub fn components(&self) -> &[ComponentDescriptor] {
        &self.components
    }

    /// 校验组件源
    pub fn validate(&self) -> IocResult<()> {
        if self.name.trim().is_empty() {
            return Err(IocError::initialization("无效的组件源: 名称为空"));
        }
        Ok(())
    }
}
