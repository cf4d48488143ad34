//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn IoC 容器各层共享的基础类型。
//!
//! ## 核心类型
//!
//! - [`TypeInfo`] - 运行时类型标识（替代反射中的 `Type`）
//! - [`SharePolicy`] - 导出实例的共享策略
//! - [`IocError`] - 容器错误分类
//!
//! ## 设计原则
//!
//! - 类型标识基于 `TypeId`，不依赖运行时反射
//! - 所有错误都是致命的，直接向调用方传播

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
