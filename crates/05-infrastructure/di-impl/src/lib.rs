//! # 依赖注入具体实现
//!
//! 提供导出图解析器、导出缓存和实例容器实现。
//!
//! 启动时 [`ExportGraph`] 扫描组件源生成不可变的 [`ExportCache`]；
//! 请求时 [`IocContainer`] 按共享策略惰性构造并缓存实例。

pub mod container;
pub mod export;
pub mod export_cache;
pub mod export_graph;
pub mod export_key;
pub mod instance_cache;
pub mod instance_factory;
pub mod shared_key;

pub use container::{ContainerBuilder, IocContainer};
pub use export::ExportRecord;
pub use export_cache::{ExportCache, ProducerLink};
pub use export_graph::ExportGraph;
pub use export_key::ExportKey;
pub use instance_cache::{InstanceCache, InstanceSlot, SlotKey};
pub use instance_factory::{InstanceFactory, ProducerBinding};
pub use shared_key::SharedGroupKey;

#[cfg(test)]
mod tests;
