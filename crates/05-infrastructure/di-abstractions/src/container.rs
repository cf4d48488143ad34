//! 依赖注入容器抽象接口
//!
//! 提供容器解析契约、容器配置和统计信息

use crate::declaration::Keying;
use crate::instance::{ExportedInstance, Instance};
use infrastructure_common::{IocError, IocResult, TypeInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// 依赖注入容器 trait
///
/// 按导出抽象类型和可选键获取实例。不带键的请求只匹配不带键的导出。
pub trait DiContainer: Send + Sync {
    /// 获取已转换为导出抽象的实例
    fn resolve(&self, exported_type: TypeInfo, keying: Keying) -> IocResult<ExportedInstance>;

    /// 获取实例（擦除类型的具体实例）
    fn get_by_type(&self, exported_type: TypeInfo) -> IocResult<Instance>;

    /// 获取带键实例（擦除类型的具体实例）
    fn get_by_type_keyed(&self, exported_type: TypeInfo, key: i32) -> IocResult<Instance>;

    /// 获取容器统计信息
    fn stats(&self) -> ContainerStats;

    /// 获取实例
    fn get<I>(&self) -> IocResult<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        self.resolve(TypeInfo::of::<I>(), Keying::Unkeyed)?.into_arc()
    }

    /// 获取带键实例
    fn get_keyed<I>(&self, key: i32) -> IocResult<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        self.resolve(TypeInfo::of::<I>(), Keying::Keyed(key))?.into_arc()
    }
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 最大解析深度，超过时视为循环依赖
    pub max_resolution_depth: usize,
    /// 是否输出导出图构建的调试日志
    pub log_resolution: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: 100,
            log_resolution: false,
        }
    }
}

impl ContainerConfig {
    /// 从 TOML 文本加载
    pub fn from_toml_str(content: &str) -> IocResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| IocError::configuration(format!("TOML 配置解析失败: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文本加载
    pub fn from_json_str(content: &str) -> IocResult<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| IocError::configuration(format!("JSON 配置解析失败: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载，按扩展名选择格式
    pub fn from_file(path: impl AsRef<Path>) -> IocResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            IocError::configuration(format!("无法读取配置文件 {}: {e}", path.display()))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(IocError::configuration(format!(
                "不支持的配置文件格式: {}",
                path.display()
            ))),
        }
    }

    /// 验证配置
    pub fn validate(&self) -> IocResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(IocError::configuration("max_resolution_depth 必须大于 0"));
        }
        Ok(())
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    /// 已注册导出数量
    pub registered_exports: usize,
    /// 共享组数量
    pub shared_groups: usize,
    /// 实例槽数量
    pub instance_slots: usize,
    /// 已构造实例数量
    pub instances_built: usize,
    /// 命中缓存次数
    pub cache_hits: usize,
}
