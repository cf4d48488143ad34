//! # 示例应用程序
//!
//! 演示如何使用 Lorn IoC 容器注册组件、声明导出并解析实例

use anyhow::{Context, Result};
use clap::Parser;
use di_abstractions::{
    ComponentBuilder, ComponentSource, ContainerConfig, DiContainer, ExportBuilder,
    InstanceProducer, ParameterInfo,
};
use di_impl::IocContainer;
use infrastructure_common::{BoxError, SharePolicy};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn IoC 示例应用")]
struct Args {
    /// 容器配置文件路径（.toml 或 .json）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 以 JSON 格式输出日志
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    info!("启动 Lorn IoC 示例应用");

    let config = load_config(&args)?;
    let container = IocContainer::builder()
        .add_source(app_source())
        .add_source(data_source())
        .with_config(config)
        .build()
        .context("构建容器失败")?;

    demonstrate_sharing(&container)?;
    demonstrate_keyed_exports(&container)?;
    demonstrate_producer(&container)?;
    demonstrate_failures(&container);

    let stats = serde_json::to_string_pretty(&container.stats())?;
    info!("容器统计信息:\n{}", stats);

    info!("应用已退出");
    Ok(())
}

/// 初始化日志
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    if args.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 加载容器配置
fn load_config(args: &Args) -> Result<ContainerConfig> {
    match &args.config {
        Some(path) if path.exists() => {
            let config = ContainerConfig::from_file(path)
                .with_context(|| format!("加载配置文件 {} 失败", path.display()))?;
            info!("已加载配置文件: {}", path.display());
            Ok(config)
        }
        Some(path) => {
            info!("配置文件 {} 不存在，将使用默认配置", path.display());
            Ok(ContainerConfig::default())
        }
        None => Ok(ContainerConfig::default()),
    }
}

/// 演示共享策略
fn demonstrate_sharing(container: &IocContainer) -> Result<()> {
    info!("演示共享策略");

    let first = container.get::<OrderService>()?;
    let second = container.get::<OrderService>()?;
    first.place_order("A-1001");
    second.place_order("A-1002");

    info!(
        "OrderService 为非共享实例: {}，日志器为同一实例: {}",
        !Arc::ptr_eq(&first, &second),
        Arc::ptr_eq(&first.logger, &second.logger)
    );
    info!("日志器已记录 {} 条消息", container.get::<dyn Logger>()?.count());
    Ok(())
}

/// 演示带键导出
fn demonstrate_keyed_exports(container: &IocContainer) -> Result<()> {
    info!("演示带键导出");

    let primary = container.get_keyed::<dyn Repository>(1)?;
    let replica = container.get_keyed::<dyn Repository>(2)?;
    let archive = container.get_keyed::<dyn Repository>(3)?;

    info!(
        "键 1 与键 2 共享实例: {}，主仓储保存了 {} 条记录",
        Arc::ptr_eq(&primary, &replica),
        primary.len()
    );
    info!("键 3 仓储 {} 保存了 {} 条记录", archive.name(), archive.len());
    Ok(())
}

/// 演示实例工厂
fn demonstrate_producer(container: &IocContainer) -> Result<()> {
    info!("演示实例工厂");

    for _ in 0..3 {
        let session = container.get::<Session>()?;
        info!("工厂创建会话: {}", session.id);
    }
    Ok(())
}

/// 演示解析失败
fn demonstrate_failures(container: &IocContainer) {
    info!("演示解析失败");

    if let Err(e) = container.get_keyed::<dyn Repository>(9) {
        warn!("解析键 9 的仓储失败: {}", e);
    }
    if let Err(e) = container.get::<dyn Repository>() {
        warn!("不带键解析仓储失败: {}", e);
    }
}

// 示例组件

/// 日志接口
trait Logger: Send + Sync {
    fn log(&self, message: &str);
    fn count(&self) -> u64;
}

/// 控制台日志器
#[derive(Default)]
struct ConsoleLogger {
    written: AtomicU64,
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        self.written.fetch_add(1, Ordering::SeqCst);
        info!("[ConsoleLogger] {}", message);
    }

    fn count(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }
}

/// 仓储接口
trait Repository: Send + Sync {
    fn name(&self) -> &str;
    fn save(&self, record: &str);
    fn len(&self) -> usize;
}

/// 内存仓储
#[derive(Default)]
struct MemoryRepository {
    records: parking_lot::Mutex<Vec<String>>,
}

impl Repository for MemoryRepository {
    fn name(&self) -> &str {
        "memory"
    }

    fn save(&self, record: &str) {
        self.records.lock().push(record.to_string());
    }

    fn len(&self) -> usize {
        self.records.lock().len()
    }
}

/// 归档仓储
#[derive(Default)]
struct ArchiveRepository;

impl Repository for ArchiveRepository {
    fn name(&self) -> &str {
        "archive"
    }

    fn save(&self, _record: &str) {}

    fn len(&self) -> usize {
        0
    }
}

/// 订单服务
struct OrderService {
    logger: Arc<dyn Logger>,
    repository: Arc<dyn Repository>,
}

impl OrderService {
    fn place_order(&self, order: &str) {
        self.repository.save(order);
        self.logger.log(&format!("订单 {order} 已保存到 {}", self.repository.name()));
    }
}

/// 数据库会话
struct Session {
    id: u64,
}

/// 会话工厂
#[derive(Default)]
struct SessionFactory {
    next_id: AtomicU64,
}

impl InstanceProducer<Session> for SessionFactory {
    fn create_instance(&self) -> Result<Session, BoxError> {
        Ok(Session {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }
}

/// 应用层组件源
fn app_source() -> ComponentSource {
    ComponentSource::new("app")
        .with_component(
            ComponentBuilder::<ConsoleLogger>::new()
                .default_constructor()
                .export_as(|logger| logger as Arc<dyn Logger>, SharePolicy::ShareGlobal),
        )
        .with_component(
            ComponentBuilder::<OrderService>::new()
                .importing_constructor(
                    vec![
                        ParameterInfo::of::<dyn Logger>(),
                        ParameterInfo::import::<dyn Repository>(1),
                    ],
                    |args| {
                        Ok(OrderService {
                            logger: args.next()?,
                            repository: args.next()?,
                        })
                    },
                )
                .export_self(SharePolicy::NonShared),
        )
}

/// 数据层组件源
fn data_source() -> ComponentSource {
    ComponentSource::new("data")
        .with_component(
            ComponentBuilder::<MemoryRepository>::new()
                .default_constructor()
                .export_keyed(
                    |repo| repo as Arc<dyn Repository>,
                    1,
                    SharePolicy::ShareExportedType,
                )
                .export_keyed(
                    |repo| repo as Arc<dyn Repository>,
                    2,
                    SharePolicy::ShareExportedType,
                ),
        )
        .with_component(
            ComponentBuilder::<ArchiveRepository>::new()
                .default_constructor()
                .export_keyed(|repo| repo as Arc<dyn Repository>, 3, SharePolicy::NonShared),
        )
        .with_component(
            ComponentBuilder::<SessionFactory>::new()
                .default_constructor()
                .export_as(
                    |factory| factory as Arc<dyn InstanceProducer<Session>>,
                    SharePolicy::ShareGlobal,
                ),
        )
        .with_component(
            ComponentBuilder::<Session>::new().export(
                ExportBuilder::<Session>::of_self()
                    .policy(SharePolicy::NonShared)
                    .produced_by::<dyn InstanceProducer<Session>>(),
            ),
        )
}
