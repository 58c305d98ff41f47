use crate::pipeline::Pipeline;
use crate::{context::AppContext, error::AppError, request::Request, request_bus::RequestBus};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use tracing::{Instrument, debug, info_span, trace};

type ErasedPipeline = Arc<dyn Any + Send + Sync>;

/// 基于内存注册表的请求分发器
/// - 通过 TypeId 注册不同请求类型对应的管道（启动时一次性完成）
/// - 以类型擦除方式保存，分发时还原为具体的 `Pipeline<R>`
/// - 调用之间无状态，可被多个任务并发共享
#[derive(Default)]
pub struct Dispatcher {
    pipelines: DashMap<TypeId, (&'static str, ErasedPipeline)>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册请求管道；同一请求类型重复注册返回 `AlreadyRegistered`
    pub fn register<R>(&self, pipeline: Pipeline<R>) -> Result<(), AppError>
    where
        R: Request,
    {
        match self.pipelines.entry(TypeId::of::<R>()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegistered { request: R::NAME }),
            Entry::Vacant(slot) => {
                slot.insert((R::NAME, Arc::new(pipeline)));
                Ok(())
            }
        }
    }

    pub fn is_registered<R: Request>(&self) -> bool {
        self.pipelines.contains_key(&TypeId::of::<R>())
    }

    /// 获取已注册的请求类型名列表（只读视图）
    pub fn registered_requests(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.pipelines.iter().map(|e| e.value().0).collect();
        names.sort_unstable();
        names
    }

    fn resolve<R>(&self) -> Result<Arc<Pipeline<R>>, AppError>
    where
        R: Request,
    {
        let Some(erased) = self
            .pipelines
            .get(&TypeId::of::<R>())
            .map(|e| e.value().1.clone())
        else {
            return Err(AppError::HandlerNotFound(R::NAME));
        };

        erased
            .downcast::<Pipeline<R>>()
            .map_err(|_| AppError::TypeMismatch {
                expected: type_name::<Pipeline<R>>(),
                found: "unknown pipeline",
            })
    }
}

#[async_trait]
impl RequestBus for Dispatcher {
    async fn send<R>(&self, ctx: &AppContext, request: R) -> Result<R::Response, AppError>
    where
        R: Request,
    {
        let span = info_span!(
            "dispatch",
            request = R::NAME,
            correlation_id = ctx.correlation_id.as_deref().unwrap_or("-"),
        );

        async move {
            trace!("received");
            ctx.ensure_active()?;

            let pipeline = self.resolve::<R>()?;
            trace!(behaviors = pipeline.len(), "behavior chain resolved");

            let result = pipeline.execute(ctx, request).await;
            match &result {
                Ok(_) => trace!("completed"),
                Err(err) => debug!(error = %err, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}
