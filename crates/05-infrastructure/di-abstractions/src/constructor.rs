//! 构造函数注册信息
//!
//! 替代反射得到的构造函数：每个组件类型在启动时登记自己的构造函数、
//! 参数列表以及参数上的导入标记。

use crate::instance::{ExportedInstance, Instance};
use infrastructure_common::{BoxError, TypeInfo};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// 构造函数类型
pub type ConstructorFn = Arc<dyn Fn(&mut Arguments) -> Result<Instance, BoxError> + Send + Sync>;

/// 参数上的显式导入标记
///
/// 用于在多个导出之间消歧：只匹配以相同抽象类型、相同键值导出的带键导出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportMarker {
    /// 导入的抽象类型
    pub exported_type: TypeInfo,
    /// 导出键
    pub key: i32,
}

/// 构造函数参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    parameter_type: TypeInfo,
    import: Option<ImportMarker>,
}

impl ParameterInfo {
    /// 按类型匹配的参数
    pub fn of<I: ?Sized + 'static>() -> Self {
        Self {
            parameter_type: TypeInfo::of::<I>(),
            import: None,
        }
    }

    /// 带导入标记的参数，按 (类型, 键) 匹配带键导出
    pub fn import<I: ?Sized + 'static>(key: i32) -> Self {
        let parameter_type = TypeInfo::of::<I>();
        Self {
            parameter_type,
            import: Some(ImportMarker {
                exported_type: parameter_type,
                key,
            }),
        }
    }

    /// 参数类型
    pub fn parameter_type(&self) -> TypeInfo {
        self.parameter_type
    }

    /// 导入标记
    pub fn import_marker(&self) -> Option<ImportMarker> {
        self.import
    }
}

/// 构造函数种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorKind {
    /// 标记为导入构造函数，参数由容器注入
    Importing,
    /// 无参构造函数
    Parameterless,
}

/// 构造函数注册信息
#[derive(Clone)]
pub struct ConstructorInfo {
    kind: ConstructorKind,
    parameters: Vec<ParameterInfo>,
    invoke: ConstructorFn,
}

impl ConstructorInfo {
    /// 创建导入构造函数
    pub fn importing(parameters: Vec<ParameterInfo>, invoke: ConstructorFn) -> Self {
        Self {
            kind: ConstructorKind::Importing,
            parameters,
            invoke,
        }
    }

    /// 创建无参构造函数
    pub fn parameterless(invoke: ConstructorFn) -> Self {
        Self {
            kind: ConstructorKind::Parameterless,
            parameters: Vec::new(),
            invoke,
        }
    }

    /// 构造函数种类
    pub fn kind(&self) -> ConstructorKind {
        self.kind
    }

    /// 参数列表
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    /// 调用构造函数
    pub fn invoke(&self, arguments: &mut Arguments) -> Result<Instance, BoxError> {
        (self.invoke)(arguments)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .field("invoke", &"<function>")
            .finish()
    }
}

/// 参数读取错误
#[derive(Error, Debug)]
pub enum ArgumentError {
    /// 参数已读取完，仍有读取请求
    #[error("{declaring_type} 的第 {position} 个参数缺失, 期望类型: {expected}")]
    Missing {
        declaring_type: TypeInfo,
        position: usize,
        expected: TypeInfo,
    },

    /// 读取类型与声明的参数类型不一致
    #[error("{declaring_type} 的第 {position} 个参数类型不匹配: 声明为 {declared}, 读取为 {requested}")]
    TypeMismatch {
        declaring_type: TypeInfo,
        position: usize,
        declared: TypeInfo,
        requested: TypeInfo,
    },
}

/// 注入给构造函数的参数
///
/// 按参数声明顺序逐个读取；读取类型必须与声明的参数类型一致。
#[derive(Debug)]
pub struct Arguments {
    declaring_type: TypeInfo,
    position: usize,
    values: VecDeque<(ParameterInfo, ExportedInstance)>,
}

impl Arguments {
    /// 创建参数列表
    pub fn new(declaring_type: TypeInfo, values: Vec<(ParameterInfo, ExportedInstance)>) -> Self {
        Self {
            declaring_type,
            position: 0,
            values: values.into(),
        }
    }

    /// 读取下一个参数
    pub fn next<I>(&mut self) -> Result<Arc<I>, ArgumentError>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let requested = TypeInfo::of::<I>();
        let position = self.position;
        let (parameter, value) = self.values.pop_front().ok_or(ArgumentError::Missing {
            declaring_type: self.declaring_type,
            position,
            expected: requested,
        })?;
        self.position += 1;

        let mismatch = || ArgumentError::TypeMismatch {
            declaring_type: self.declaring_type,
            position,
            declared: parameter.parameter_type(),
            requested,
        };

        if parameter.parameter_type() != requested {
            return Err(mismatch());
        }
        value.downcast::<I>().map_err(|_| mismatch())
    }

    /// 剩余参数数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有剩余参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
