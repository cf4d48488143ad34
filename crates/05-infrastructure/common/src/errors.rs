//! 错误类型定义

use thiserror::Error;

/// 构造过程中由用户代码返回的底层错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 容器错误类型
///
/// 所有变体都是致命错误：容器不做本地恢复或重试。
#[derive(Error, Debug)]
pub enum IocError {
    /// 模块无效、共享策略混用、共享导出组缺失或解析深度超限
    #[error("容器初始化失败: {message}")]
    Initialization { message: String },

    /// 构造参数无法匹配到任何导出或导入
    #[error("依赖解析失败: {type_name}, 原因: {message}")]
    FailedDependency { type_name: String, message: String },

    /// 查找时匹配到多个导出
    #[error("发现重复导出: {type_name}, 候选: {candidates:?}")]
    DuplicateExport {
        type_name: String,
        candidates: Vec<String>,
    },

    /// 解析链中检测到循环依赖
    #[error("检测到循环依赖: {export}, 依赖链: {}", .chain.join(" -> "))]
    CircularDependency { export: String, chain: Vec<String> },

    /// 构造实例或调用实例工厂失败
    #[error("实例创建失败: {type_name}, 原因: {source}")]
    InstanceCreation { type_name: String, source: BoxError },

    /// 内部状态不一致（例如实例槽已就绪但没有实例）
    #[error("导出状态不一致: {export}, 原因: {message}")]
    ExportConsistency { export: String, message: String },

    /// 容器配置无效或无法加载
    #[error("容器配置错误: {message}")]
    Configuration { message: String },
}

impl IocError {
    /// 创建初始化错误
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    /// 创建依赖解析失败错误
    pub fn failed_dependency(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FailedDependency {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// 创建实例创建错误
    pub fn instance_creation(type_name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::InstanceCreation {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 创建导出状态不一致错误
    pub fn export_consistency(export: impl ToString, message: impl Into<String>) -> Self {
        Self::ExportConsistency {
            export: export.to_string(),
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// 结果类型别名
pub type IocResult<T> = Result<T, IocError>;
