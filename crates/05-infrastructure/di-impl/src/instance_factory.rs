//! 实例工厂
//!
//! 为声明类型选定唯一的构造函数，或把实例工厂的生产方法绑定到目标类型。

use di_abstractions::{
    Arguments, ConstructorInfo, ConstructorKind, ExportedInstance, Instance, ParameterInfo,
    ProducerDeclaration, ProducerFn,
};
use infrastructure_common::{IocError, IocResult, TypeInfo};
use std::fmt;

/// 声明类型的实例工厂
#[derive(Debug, Clone)]
pub struct InstanceFactory {
    declaring_type: TypeInfo,
    constructor: ConstructorInfo,
}

impl InstanceFactory {
    /// 选定构造函数
    ///
    /// 优先使用唯一的导入构造函数，其次是无参构造函数。
    pub fn for_type(declaring_type: TypeInfo, constructors: &[ConstructorInfo]) -> IocResult<Self> {
        let mut importing = constructors
            .iter()
            .filter(|c| c.kind() == ConstructorKind::Importing);

        let constructor = match (importing.next(), importing.next()) {
            (Some(constructor), None) => constructor,
            (Some(_), Some(_)) => {
                return Err(IocError::instance_creation(
                    declaring_type.name(),
                    "存在多个导入构造函数",
                ))
            }
            (None, _) => constructors
                .iter()
                .find(|c| c.kind() == ConstructorKind::Parameterless)
                .ok_or_else(|| {
                    IocError::instance_creation(
                        declaring_type.name(),
                        "既没有导入构造函数也没有无参构造函数",
                    )
                })?,
        };

        Ok(Self {
            declaring_type,
            constructor: constructor.clone(),
        })
    }

    /// 实例工厂所属的声明类型
    pub fn declaring_type(&self) -> TypeInfo {
        self.declaring_type
    }

    /// 选定构造函数的参数列表
    pub fn parameters(&self) -> &[ParameterInfo] {
        self.constructor.parameters()
    }

    /// 用依赖实例调用构造函数，依赖按参数顺序给出
    pub fn create(&self, dependencies: Vec<ExportedInstance>) -> IocResult<Instance> {
        let parameters = self.parameters();
        if parameters.len() != dependencies.len() {
            return Err(IocError::instance_creation(
                self.declaring_type.name(),
                format!(
                    "参数数量不匹配: 需要 {}, 提供 {}",
                    parameters.len(),
                    dependencies.len()
                ),
            ));
        }

        let mut arguments = Arguments::new(
            self.declaring_type,
            parameters.iter().copied().zip(dependencies).collect(),
        );
        self.constructor
            .invoke(&mut arguments)
            .map_err(|e| IocError::instance_creation(self.declaring_type.name(), e))
    }
}

/// 绑定到目标类型的实例工厂生产方法
///
/// 不持有工厂实例，调用时由调用方提供。
#[derive(Clone)]
pub struct ProducerBinding {
    product_type: TypeInfo,
    factory_type: TypeInfo,
    produce: ProducerFn,
}

impl ProducerBinding {
    /// 把工厂声明绑定到产品类型
    pub fn bind(product_type: TypeInfo, producer: &ProducerDeclaration) -> Self {
        Self {
            product_type,
            factory_type: producer.factory_type(),
            produce: producer.produce().clone(),
        }
    }

    /// 产品类型
    pub fn product_type(&self) -> TypeInfo {
        self.product_type
    }

    /// 工厂的导出抽象类型
    pub fn factory_type(&self) -> TypeInfo {
        self.factory_type
    }

    /// 用存活的工厂实例生产目标实例
    pub fn invoke(&self, factory: ExportedInstance) -> IocResult<Instance> {
        (self.produce)(factory).map_err(|e| IocError::instance_creation(self.product_type.name(), e))
    }
}

impl fmt::Debug for ProducerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerBinding")
            .field("product_type", &self.product_type.name())
            .field("factory_type", &self.factory_type.name())
            .finish_non_exhaustive()
    }
}
