//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义导出声明模型和容器契约。
//!
//! 容器不依赖运行时反射：组件类型、构造函数和导出声明都通过显式注册表描述，
//! 在启动时一次性读入。
//!
//! ## 核心接口
//!
//! - [`ComponentSource`] - 组件源（一组组件描述符）
//! - [`ComponentBuilder`] - 组件描述符构建器
//! - [`ExportDeclaration`] - 导出声明
//! - [`ConstructorInfo`] - 构造函数注册信息
//! - [`InstanceProducer`] - 用户实例工厂接口
//! - [`DiContainer`] - 容器解析接口

pub mod component;
pub mod constructor;
pub mod container;
pub mod declaration;
pub mod factory;
pub mod instance;

pub use component::*;
pub use constructor::*;
pub use container::*;
pub use declaration::*;
pub use factory::*;
pub use instance::*;
