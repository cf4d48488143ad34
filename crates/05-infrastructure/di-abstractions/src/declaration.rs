//! 导出声明模型
//!
//! 描述一个组件类型如何被导出：导出的抽象类型、共享策略、可选的整数键，
//! 以及可选的实例工厂。

use crate::instance::{ExportedInstance, Instance};
use infrastructure_common::{BoxError, SharePolicy, TypeInfo};
use std::fmt;
use std::sync::Arc;

/// 把具体实例转换为导出抽象，类型不符时返回 `None`
pub type UpcastFn = Arc<dyn Fn(Instance) -> Option<ExportedInstance> + Send + Sync>;

/// 用存活的工厂实例生产目标实例
pub type ProducerFn = Arc<dyn Fn(ExportedInstance) -> Result<Instance, BoxError> + Send + Sync>;

/// 导出键设置
///
/// 带键导出必须携带显式键值；不带键的导出隐式使用键值 0，只按类型匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Keying {
    /// 不带键
    #[default]
    Unkeyed,
    /// 带键
    Keyed(i32),
}

impl Keying {
    /// 是否带键
    pub fn is_keyed(self) -> bool {
        matches!(self, Self::Keyed(_))
    }

    /// 键值，不带键时为 0
    pub fn key(self) -> i32 {
        match self {
            Self::Keyed(key) => key,
            Self::Unkeyed => 0,
        }
    }
}

impl From<Option<i32>> for Keying {
    fn from(key: Option<i32>) -> Self {
        key.map_or(Self::Unkeyed, Self::Keyed)
    }
}

impl fmt::Display for Keying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyed(key) => write!(f, "key={key}"),
            Self::Unkeyed => f.write_str("unkeyed"),
        }
    }
}

/// 实例工厂声明
///
/// 工厂本身也是一个导出，通过导出类型和选择器定位。
#[derive(Clone)]
pub struct ProducerDeclaration {
    factory_type: TypeInfo,
    selector: Keying,
    produce: ProducerFn,
}

impl ProducerDeclaration {
    /// 创建实例工厂声明
    pub fn new(factory_type: TypeInfo, selector: Keying, produce: ProducerFn) -> Self {
        Self {
            factory_type,
            selector,
            produce,
        }
    }

    /// 工厂的导出类型
    pub fn factory_type(&self) -> TypeInfo {
        self.factory_type
    }

    /// 工厂导出的选择器
    pub fn selector(&self) -> Keying {
        self.selector
    }

    /// 生产函数
    pub fn produce(&self) -> &ProducerFn {
        &self.produce
    }
}

impl fmt::Debug for ProducerDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerDeclaration")
            .field("factory_type", &self.factory_type.name())
            .field("selector", &self.selector)
            .field("produce", &"<function>")
            .finish()
    }
}

/// 导出声明
///
/// 构建后不可变。
#[derive(Clone)]
pub struct ExportDeclaration {
    declaring_type: TypeInfo,
    exported_type: TypeInfo,
    policy: SharePolicy,
    keying: Keying,
    producer: Option<ProducerDeclaration>,
    upcast: UpcastFn,
}

impl ExportDeclaration {
    /// 创建导出声明
    pub fn new(
        declaring_type: TypeInfo,
        exported_type: TypeInfo,
        policy: SharePolicy,
        keying: Keying,
        upcast: UpcastFn,
    ) -> Self {
        Self {
            declaring_type,
            exported_type,
            policy,
            keying,
            producer: None,
            upcast,
        }
    }

    /// 设置实例工厂
    pub fn with_producer(mut self, producer: ProducerDeclaration) -> Self {
        self.producer = Some(producer);
        self
    }

    /// 声明类型（实际构造的类型）
    pub fn declaring_type(&self) -> TypeInfo {
        self.declaring_type
    }

    /// 导出的抽象类型
    pub fn exported_type(&self) -> TypeInfo {
        self.exported_type
    }

    /// 共享策略
    pub fn policy(&self) -> SharePolicy {
        self.policy
    }

    /// 导出键设置
    pub fn keying(&self) -> Keying {
        self.keying
    }

    /// 实例工厂
    pub fn producer(&self) -> Option<&ProducerDeclaration> {
        self.producer.as_ref()
    }

    /// 转换函数
    pub fn upcast(&self) -> &UpcastFn {
        &self.upcast
    }
}

impl fmt::Debug for ExportDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportDeclaration")
            .field("declaring_type", &self.declaring_type.name())
            .field("exported_type", &self.exported_type.name())
            .field("policy", &self.policy)
            .field("keying", &self.keying)
            .field("producer", &self.producer)
            .finish_non_exhaustive()
    }
}
