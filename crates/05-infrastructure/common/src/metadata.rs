//! 元数据定义
//!
//! 提供容器使用的运行时类型标识

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型信息
///
/// 同一进程内由 `TypeId` 唯一确定，名称仅用于诊断输出。
/// 既可以描述具体类型，也可以描述 `dyn Trait` 这样的导出抽象。
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// 类型ID
    id: TypeId,
    /// 完整类型名称
    name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 类型ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称（包含模块路径）
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称（不包含模块路径）
    ///
    /// 泛型参数中的路径同样被去掉，例如 `dyn a::Producer<b::Session>` 显示为
    /// `Producer<Session>`。
    pub fn short_name(&self) -> String {
        let trimmed = self.name.trim_start_matches("dyn ");
        let mut short = String::with_capacity(trimmed.len());
        let mut segment = String::new();
        for ch in trimmed.chars() {
            if ch.is_alphanumeric() || ch == '_' || ch == ':' {
                segment.push(ch);
            } else {
                short.push_str(last_segment(&segment));
                segment.clear();
                short.push(ch);
            }
        }
        short.push_str(last_segment(&segment));
        short
    }

    /// 是否描述同一个类型
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
