//! 进程内事件总线（InProcessEventBus）
//!
//! 满足 `EventBus` 协议的进程内实现：
//! - `publish`：按事件类型匹配处理器并发执行，同时广播给订阅者；
//! - `publish_batch`：逐条发布，单条失败不影响后续事件，最后汇总返回首个错误；
//! - `subscribe`：返回 `'static` 生命周期事件流，便于在 `tokio::spawn` 中使用。
//!
//! 注意：无订阅者时广播会被忽略；处理器失败不会重试，由调用方决定如何上报。

use super::handler::HandledEventType;
use super::{EventBus, EventHandler};
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::SerializedEvent;
use async_trait::async_trait;
use bon::Builder;
use futures_core::stream::BoxStream;
use futures_util::future::BoxFuture;
use futures_util::{StreamExt, stream};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// 进程内总线配置
#[derive(Builder, Clone, Copy, Debug)]
pub struct InProcessEventBusConfig {
    /// 广播缓冲区容量
    #[builder(default = 256)]
    pub capacity: usize,
    /// 单事件的处理并发（同一事件分发给多个 handler）
    #[builder(default = 8)]
    pub handler_concurrency: usize,
}

impl Default for InProcessEventBusConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            handler_concurrency: 8,
        }
    }
}

#[derive(Clone)]
pub struct InProcessEventBus {
    tx: broadcast::Sender<SerializedEvent>,
    registry: HandlerRegistry,
    config: InProcessEventBusConfig,
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new(Vec::new(), InProcessEventBusConfig::default())
    }
}

impl InProcessEventBus {
    pub fn new(handlers: Vec<Arc<dyn EventHandler>>, config: InProcessEventBusConfig) -> Self {
        let (tx, _rx) = broadcast::channel(config.capacity.max(1));
        Self {
            tx,
            registry: HandlerRegistry::new(handlers),
            config,
        }
    }

    pub fn with_handlers(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        Self::new(handlers, InProcessEventBusConfig::default())
    }
}

#[async_trait]
impl EventBus for InProcessEventBus {
    async fn publish(&self, event: &SerializedEvent) -> Result<()> {
        // 若当前无订阅者，broadcast 的 send 会返回错误，这里视为非致命并忽略
        let _ = self.tx.send(event.clone());

        let handlers = self.registry.matching(event.event_type());
        if handlers.is_empty() {
            return Ok(());
        }

        let tasks: Vec<BoxFuture<'_, Result<()>>> = handlers
            .into_iter()
            .map(|h: Arc<dyn EventHandler>| -> BoxFuture<'_, Result<()>> {
                Box::pin(async move {
                    h.handle(event).await.map_err(|err| DomainError::EventHandler {
                        handler: h.handler_name().to_string(),
                        reason: err.to_string(),
                    })
                })
            })
            .collect();

        let outcomes: Vec<Result<()>> = stream::iter(tasks)
            .buffer_unordered(self.config.handler_concurrency.max(1))
            .collect()
            .await;
        let failures: Vec<DomainError> = outcomes.into_iter().filter_map(|r| r.err()).collect();

        for err in &failures {
            warn!(event_type = event.event_type(), event_id = event.event_id(), error = %err, "event handler failed");
        }

        match failures.into_iter().next() {
            Some(err) => Err(err),
            None => {
                debug!(event_type = event.event_type(), "event handled");
                Ok(())
            }
        }
    }

    async fn publish_batch(&self, events: &[SerializedEvent]) -> Result<()> {
        let mut first_err = None;
        for event in events {
            if let Err(err) = self.publish(event).await {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn subscribe(&self) -> BoxStream<'static, Result<SerializedEvent>> {
        let rx = self.tx.subscribe();
        let stream =
            BroadcastStream::new(rx).map(|r| r.map_err(|e| DomainError::event_bus(e.to_string())));
        Box::pin(stream)
    }
}

#[derive(Clone, Default)]
struct HandlerRegistry {
    by_type: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    all: Vec<Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    fn new(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        let mut by_type: HashMap<String, Vec<Arc<dyn EventHandler>>> = HashMap::new();
        let mut all: Vec<Arc<dyn EventHandler>> = Vec::new();

        for h in handlers {
            match h.handled_event_type() {
                HandledEventType::All => all.push(h),
                HandledEventType::One(t) => {
                    by_type.entry(t).or_default().push(h);
                }
                HandledEventType::Many(ts) => {
                    for t in ts {
                        by_type.entry(t).or_default().push(h.clone());
                    }
                }
            }
        }

        Self { by_type, all }
    }

    fn matching(&self, event_type: &str) -> Vec<Arc<dyn EventHandler>> {
        let mut merged: Vec<Arc<dyn EventHandler>> = Vec::new();
        if let Some(list) = self.by_type.get(event_type) {
            merged.extend(list.iter().cloned());
        }
        merged.extend(self.all.iter().cloned());
        merged
    }
}
