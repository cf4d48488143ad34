//! 容器集成测试
//!
//! 覆盖导出图构建和实例构造的端到端场景

use anyhow::Result;
use di_abstractions::{
    ComponentBuilder, ComponentSource, ContainerConfig, DiContainer, ExportBuilder, ParameterInfo,
};
use di_impl::{ExportGraph, ExportKey, IocContainer};
use infrastructure_common::{IocError, SharePolicy};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 测试用的共享记录
#[derive(Default)]
struct Journal {
    entries: Mutex<Vec<String>>,
}

impl Journal {
    fn write(&self, entry: &str) {
        self.entries.lock().push(entry.to_string());
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

trait Logger: Send + Sync {
    fn log(&self, message: &str);
    fn lines(&self) -> usize;
}

#[derive(Default)]
struct ConsoleLogger {
    journal: Journal,
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        self.journal.write(message);
    }

    fn lines(&self) -> usize {
        self.journal.entries().len()
    }
}

struct Service {
    logger: Arc<dyn Logger>,
}

impl Service {
    fn run(&self) {
        self.logger.log("service run");
    }
}

fn logger_and_service() -> ComponentSource {
    ComponentSource::new("app")
        .with_component(
            ComponentBuilder::<ConsoleLogger>::new()
                .default_constructor()
                .export_as(|logger| logger as Arc<dyn Logger>, SharePolicy::ShareGlobal),
        )
        .with_component(
            ComponentBuilder::<Service>::new()
                .importing_constructor(vec![ParameterInfo::of::<dyn Logger>()], |args| {
                    Ok(Service {
                        logger: args.next()?,
                    })
                })
                .export_self(SharePolicy::NonShared),
        )
}

#[test]
fn service_instances_share_one_logger() -> Result<()> {
    init_test_logger();
    let container = IocContainer::new(&[logger_and_service()])?;

    let first = container.get::<Service>()?;
    let second = container.get::<Service>()?;
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.logger, &second.logger));

    first.run();
    second.run();
    assert_eq!(container.get::<dyn Logger>()?.lines(), 2);
    Ok(())
}

#[derive(Default)]
struct Repo {
    journal: Journal,
}

fn keyed_repo() -> ComponentSource {
    ComponentSource::new("data").with_component(
        ComponentBuilder::<Repo>::new()
            .default_constructor()
            .export(
                ExportBuilder::<Repo>::of_self()
                    .keyed(1)
                    .policy(SharePolicy::ShareExportedType),
            )
            .export(
                ExportBuilder::<Repo>::of_self()
                    .keyed(2)
                    .policy(SharePolicy::ShareExportedType),
            ),
    )
}

#[test]
fn keyed_repos_share_the_group_slot() -> Result<()> {
    init_test_logger();
    let container = IocContainer::new(&[keyed_repo()])?;

    let one = container.get_keyed::<Repo>(1)?;
    let two = container.get_keyed::<Repo>(2)?;
    one.journal.write("saved through key 1");
    assert!(Arc::ptr_eq(&one, &two));
    assert_eq!(two.journal.entries(), vec!["saved through key 1".to_string()]);

    assert!(matches!(
        container.get_keyed::<Repo>(3),
        Err(IocError::FailedDependency { .. })
    ));
    Ok(())
}

trait Metrics: Send + Sync {}
trait Health: Send + Sync {}

#[derive(Default)]
struct Monitor;

impl Metrics for Monitor {}
impl Health for Monitor {}

#[test]
fn share_global_is_one_instance_per_declaring_type() -> Result<()> {
    let source = ComponentSource::new("ops").with_component(
        ComponentBuilder::<Monitor>::new()
            .default_constructor()
            .export_self(SharePolicy::ShareGlobal)
            .export_as(|m| m as Arc<dyn Metrics>, SharePolicy::ShareGlobal)
            .export_as(|m| m as Arc<dyn Health>, SharePolicy::ShareGlobal),
    );
    let container = IocContainer::new(&[source])?;

    let monitor = container.get::<Monitor>()?;
    let metrics = container.get::<dyn Metrics>()?;
    let health = container.get::<dyn Health>()?;
    assert_eq!(Arc::as_ptr(&monitor) as *const (), Arc::as_ptr(&metrics) as *const ());
    assert_eq!(Arc::as_ptr(&monitor) as *const (), Arc::as_ptr(&health) as *const ());
    assert_eq!(container.stats().instances_built, 1);
    Ok(())
}

#[test]
fn mixing_share_global_with_other_policies_fails() {
    let source = ComponentSource::new("ops").with_component(
        ComponentBuilder::<Monitor>::new()
            .default_constructor()
            .export_as(|m| m as Arc<dyn Metrics>, SharePolicy::ShareGlobal)
            .export_as(|m| m as Arc<dyn Health>, SharePolicy::ShareExportedType),
    );

    assert!(matches!(
        IocContainer::new(&[source]),
        Err(IocError::Initialization { .. })
    ));
}

struct Left {
    _right: Arc<Right>,
}

struct Right {
    _left: Arc<Left>,
}

#[test]
fn two_type_cycle_names_the_first_type() {
    let source = ComponentSource::new("cycle")
        .with_component(
            ComponentBuilder::<Left>::new()
                .importing_constructor(vec![ParameterInfo::of::<Right>()], |args| {
                    Ok(Left {
                        _right: args.next()?,
                    })
                })
                .export_self(SharePolicy::ShareGlobal),
        )
        .with_component(
            ComponentBuilder::<Right>::new()
                .importing_constructor(vec![ParameterInfo::of::<Left>()], |args| {
                    Ok(Right {
                        _left: args.next()?,
                    })
                })
                .export_self(SharePolicy::ShareGlobal),
        );

    match IocContainer::new(&[source]) {
        Err(IocError::CircularDependency { export, .. }) => assert!(export.starts_with("Left")),
        Err(other) => panic!("意外的错误: {other}"),
        Ok(_) => panic!("循环依赖应当被拒绝"),
    }
}

struct Audit {
    _logger: Arc<dyn Logger>,
}

#[derive(Default)]
struct FileLogger;

impl Logger for FileLogger {
    fn log(&self, _message: &str) {}

    fn lines(&self) -> usize {
        0
    }
}

fn audit_component() -> ComponentBuilder<Audit> {
    ComponentBuilder::<Audit>::new()
        .importing_constructor(vec![ParameterInfo::of::<dyn Logger>()], |args| {
            Ok(Audit {
                _logger: args.next()?,
            })
        })
        .export_self(SharePolicy::NonShared)
}

#[test]
fn parameter_candidates_must_be_unique() {
    let ambiguous = ComponentSource::new("audit")
        .with_component(
            ComponentBuilder::<ConsoleLogger>::new()
                .default_constructor()
                .export_as(|l| l as Arc<dyn Logger>, SharePolicy::ShareGlobal),
        )
        .with_component(
            ComponentBuilder::<FileLogger>::new()
                .default_constructor()
                .export_as(|l| l as Arc<dyn Logger>, SharePolicy::ShareGlobal),
        )
        .with_component(audit_component());
    assert!(matches!(
        IocContainer::new(&[ambiguous]),
        Err(IocError::DuplicateExport { .. })
    ));

    let missing = ComponentSource::new("audit").with_component(audit_component());
    assert!(matches!(
        IocContainer::new(&[missing]),
        Err(IocError::FailedDependency { .. })
    ));
}

#[test]
fn import_marker_picks_the_keyed_logger() -> Result<()> {
    let source = ComponentSource::new("audit")
        .with_component(
            ComponentBuilder::<ConsoleLogger>::new()
                .default_constructor()
                .export_keyed(|l| l as Arc<dyn Logger>, 1, SharePolicy::ShareGlobal),
        )
        .with_component(
            ComponentBuilder::<FileLogger>::new()
                .default_constructor()
                .export_keyed(|l| l as Arc<dyn Logger>, 2, SharePolicy::ShareGlobal),
        )
        .with_component(
            ComponentBuilder::<Service>::new()
                .importing_constructor(vec![ParameterInfo::import::<dyn Logger>(1)], |args| {
                    Ok(Service {
                        logger: args.next()?,
                    })
                })
                .export_self(SharePolicy::NonShared),
        );
    let container = IocContainer::new(&[source])?;

    let service = container.get::<Service>()?;
    service.run();
    assert_eq!(container.get_keyed::<dyn Logger>(1)?.lines(), 1);
    assert_eq!(container.get_keyed::<dyn Logger>(2)?.lines(), 0);
    Ok(())
}

#[test]
fn export_key_hashes_are_stable_across_builds() -> Result<()> {
    let config = ContainerConfig::default();
    let first_sources = [logger_and_service(), keyed_repo()];
    let second_sources = [logger_and_service(), keyed_repo()];

    let first = ExportGraph::build_cache(&first_sources, &config)?;
    let second = ExportGraph::build_cache(&second_sources, &config)?;

    let hashes = |keys: &[ExportKey]| keys.iter().map(ExportKey::identity_hash).collect::<Vec<_>>();
    assert_eq!(hashes(first.exports()), hashes(second.exports()));
    assert_eq!(first.exports().len(), 4);
    Ok(())
}

#[test]
fn container_reads_config_file() -> Result<()> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(file, "max_resolution_depth = 32")?;
    writeln!(file, "log_resolution = true")?;

    let config = ContainerConfig::from_file(file.path())?;
    assert_eq!(config.max_resolution_depth, 32);

    let container = IocContainer::builder()
        .add_source(logger_and_service())
        .with_config(config)
        .build()?;
    assert_eq!(container.exports().len(), 2);
    Ok(())
}

struct Expensive;

#[test]
fn shared_instance_is_built_once_under_contention() -> Result<()> {
    init_test_logger();
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let source = ComponentSource::new("heavy").with_component(
        ComponentBuilder::<Expensive>::new()
            .parameterless(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(20));
                Ok(Expensive)
            })
            .export_self(SharePolicy::ShareGlobal),
    );
    let container = IocContainer::new(&[source])?;

    let instances: Vec<Arc<Expensive>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| container.get::<Expensive>()))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("线程异常退出"))
            .collect::<Result<_, _>>()
    })?;

    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(instances.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(container.stats().cache_hits, 7);
    Ok(())
}
