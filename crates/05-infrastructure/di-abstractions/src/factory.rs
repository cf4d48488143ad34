//! 实例工厂抽象接口
//!
//! 组件可以声明由另一个导出（工厂）来生产自己的实例。工厂本身作为普通组件
//! 注册并导出 `InstanceProducer<T>` 抽象。

use crate::declaration::ProducerFn;
use crate::instance::{ExportedInstance, Instance};
use infrastructure_common::{BoxError, TypeInfo};
use std::marker::PhantomData;
use std::sync::Arc;

/// 实例工厂 trait
///
/// 为类型 `T` 生产实例
pub trait InstanceProducer<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// 创建实例
    fn create_instance(&self) -> Result<T, BoxError>;
}

/// Lambda 工厂包装器
pub struct LambdaProducer<T, F>
where
    T: Send + Sync + 'static,
    F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
{
    producer_fn: F,
    product_type: PhantomData<fn() -> T>,
}

impl<T, F> LambdaProducer<T, F>
where
    T: Send + Sync + 'static,
    F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
{
    /// 使用闭包创建实例工厂
    pub fn new(producer_fn: F) -> Self {
        Self {
            producer_fn,
            product_type: PhantomData,
        }
    }
}

impl<T, F> InstanceProducer<T> for LambdaProducer<T, F>
where
    T: Send + Sync + 'static,
    F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
{
    fn create_instance(&self) -> Result<T, BoxError> {
        (self.producer_fn)()
    }
}

/// 生成调用工厂导出 `P` 来生产 `T` 的函数
///
/// `P` 是工厂的导出抽象，通常为 `dyn InstanceProducer<T>`。
pub fn producer_fn<T, P>() -> ProducerFn
where
    T: Send + Sync + 'static,
    P: ?Sized + InstanceProducer<T> + Send + Sync + 'static,
{
    Arc::new(|factory: ExportedInstance| -> Result<Instance, BoxError> {
        let factory = factory.downcast::<P>().map_err(|instance| {
            format!(
                "工厂导出类型 {} 与声明的工厂类型 {} 不一致",
                instance.exported_type(),
                TypeInfo::of::<P>()
            )
        })?;
        let product = factory.create_instance()?;
        Ok(Arc::new(product) as Instance)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Connection(u16);

    #[test]
    fn lambda_producer_creates_instances() {
        let producer = LambdaProducer::new(|| Ok(Connection(5432)));

        assert_eq!(producer.create_instance().unwrap(), Connection(5432));
    }

    #[test]
    fn producer_fn_invokes_exported_factory() {
        let factory: Arc<dyn InstanceProducer<Connection>> =
            Arc::new(LambdaProducer::new(|| Ok(Connection(6379))));
        let produce = producer_fn::<Connection, dyn InstanceProducer<Connection>>();

        let instance = produce(ExportedInstance::new(factory)).unwrap();
        let connection = instance.downcast::<Connection>().unwrap();
        assert_eq!(connection.0, 6379);
    }

    #[test]
    fn producer_fn_rejects_other_exports() {
        let produce = producer_fn::<Connection, dyn InstanceProducer<Connection>>();

        let error = produce(ExportedInstance::new(Arc::new(Connection(1))))
            .err()
            .expect("Connection 不是工厂");
        assert!(error.to_string().contains("工厂导出类型"));
    }
}
