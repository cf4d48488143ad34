//! 实例表示
//!
//! 容器内部以擦除类型的具体实例保存对象；交给调用方或注入构造函数时，
//! 再按导出抽象转换为 `Arc<I>`。

use infrastructure_common::{IocError, IocResult, TypeInfo};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 擦除类型的具体实例（声明类型 `T` 的 `Arc<T>`）
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 已转换为导出抽象的实例
///
/// 内部保存 `Arc<I>`，其中 `I` 是导出抽象类型（可以是 `dyn Trait`）。
pub struct ExportedInstance {
    exported_type: TypeInfo,
    value: Box<dyn Any + Send + Sync>,
}

impl ExportedInstance {
    /// 包装导出抽象实例
    pub fn new<I>(value: Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            exported_type: TypeInfo::of::<I>(),
            value: Box::new(value),
        }
    }

    /// 导出抽象类型
    pub fn exported_type(&self) -> TypeInfo {
        self.exported_type
    }

    /// 按导出抽象取回实例
    pub fn downcast<I>(self) -> Result<Arc<I>, Self>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let exported_type = self.exported_type;
        match self.value.downcast::<Arc<I>>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self {
                exported_type,
                value,
            }),
        }
    }

    /// 按导出抽象借用实例
    pub fn downcast_ref<I>(&self) -> Option<&Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.value.downcast_ref::<Arc<I>>()
    }

    /// 按导出抽象取回实例，类型不一致时返回容器错误
    pub fn into_arc<I>(self) -> IocResult<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.downcast::<I>().map_err(|instance| {
            IocError::export_consistency(
                instance.exported_type,
                format!("导出实例类型与请求类型 {} 不一致", TypeInfo::of::<I>()),
            )
        })
    }
}

impl fmt::Debug for ExportedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedInstance")
            .field("exported_type", &self.exported_type.name())
            .finish_non_exhaustive()
    }
}
