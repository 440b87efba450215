use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::{fmt, io};

use redis::aio::{ConnectionLike, ConnectionManager, MultiplexedConnection};
use redis::{Cmd, ErrorKind, Pipeline, RedisError, RedisFuture, RedisResult, Value};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

pub const QUEUE_EXCEEDED: &str = "request queue size exceeded";

/// 单连接上未完成请求数的上限
#[derive(Clone, Debug)]
pub struct RequestQueue {
    permits: Option<Arc<Semaphore>>,
}

impl RequestQueue {
    /// 超过 `Semaphore::MAX_PERMITS` 视为不限制
    pub fn new(size: usize) -> Self {
        let permits = (size < Semaphore::MAX_PERMITS).then(|| Arc::new(Semaphore::new(size)));
        Self { permits }
    }

    pub fn is_bounded(&self) -> bool { self.permits.is_some() }

    /// 当前可用的名额, 不限制时为 `None`
    pub fn available(&self) -> Option<usize> { self.permits.as_ref().map(|p| p.available_permits()) }

    pub fn acquire(&self) -> RedisResult<Option<OwnedSemaphorePermit>> {
        let Some(permits) = &self.permits else {
            return Ok(None);
        };
        match permits.clone().try_acquire_owned() {
            Ok(permit) => Ok(Some(permit)),
            Err(TryAcquireError::NoPermits) => Err(RedisError::from((ErrorKind::ClientError, QUEUE_EXCEEDED))),
            Err(TryAcquireError::Closed) => Err(RedisError::from((ErrorKind::ClientError, "request queue closed"))),
        }
    }
}

#[derive(Clone)]
enum Inner {
    Managed(ConnectionManager),
    Multiplexed(MultiplexedConnection),
}

impl Inner {
    fn conn(&mut self) -> &mut (dyn ConnectionLike + Send) {
        match self {
            Inner::Managed(c) => c,
            Inner::Multiplexed(c) => c,
        }
    }
}

/// 连接状态, 所有克隆出的句柄共享
#[derive(Debug, Default)]
struct LinkState {
    disconnected: AtomicBool,
    reconnecting: AtomicBool,
}

/// 一次请求的执行上下文, 可以整体移入新任务
#[derive(Clone)]
struct Dispatch {
    inner: Inner,
    link: Arc<LinkState>,
    accept: bool,
}

impl Dispatch {
    async fn command(mut self, cmd: &Cmd) -> RedisResult<Value> {
        self.reject_if_disconnected()?;
        let result = match self.inner.conn().req_packed_command(cmd).await {
            Err(e) if self.accept && is_disconnect(&e) => {
                tracing::debug!(error = %e, "redis connection lost, resending command");
                self.inner.conn().req_packed_command(cmd).await
            }
            other => other,
        };
        self.observe(result)
    }

    async fn pipeline(mut self, pipeline: &Pipeline, offset: usize, count: usize) -> RedisResult<Vec<Value>> {
        self.reject_if_disconnected()?;
        let result = match self.inner.conn().req_packed_commands(pipeline, offset, count).await {
            Err(e) if self.accept && is_disconnect(&e) => {
                tracing::debug!(error = %e, "redis connection lost, resending pipeline");
                self.inner.conn().req_packed_commands(pipeline, offset, count).await
            }
            other => other,
        };
        self.observe(result)
    }

    /// 拒绝模式下, 断开期间的命令立即失败, 重连交给后台
    fn reject_if_disconnected(&self) -> RedisResult<()> {
        if self.accept || !self.link.disconnected.load(Ordering::Acquire) {
            return Ok(());
        }
        self.reconnect_in_background();
        Err(disconnected_error())
    }

    fn observe<T>(&self, result: RedisResult<T>) -> RedisResult<T> {
        match &result {
            Ok(_) => {
                if self.link.disconnected.swap(false, Ordering::AcqRel) {
                    tracing::debug!("redis connection restored");
                }
            }
            Err(e) if is_disconnect(e) => {
                if !self.link.disconnected.swap(true, Ordering::AcqRel) {
                    tracing::debug!(error = %e, "redis connection marked as disconnected");
                }
                if !self.accept {
                    self.reconnect_in_background();
                }
            }
            Err(_) => {}
        }
        result
    }

    fn reconnect_in_background(&self) {
        let Inner::Managed(manager) = &self.inner else {
            return;
        };
        if self.link.reconnecting.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut manager = manager.clone();
        let link = self.link.clone();
        tokio::spawn(async move {
            match redis::cmd("PING").query_async::<()>(&mut manager).await {
                Ok(()) => {
                    link.disconnected.store(false, Ordering::Release);
                    tracing::debug!("redis connection restored in background");
                }
                Err(e) => tracing::debug!(error = %e, "redis background reconnect failed"),
            }
            link.reconnecting.store(false, Ordering::Release);
        });
    }
}

/// 连接被断开或拒绝. 超时不算断开, 超时的命令可能已经在服务端执行
fn is_disconnect(e: &RedisError) -> bool { e.is_connection_dropped() || e.is_connection_refusal() }

fn disconnected_error() -> RedisError {
    RedisError::from(io::Error::new(io::ErrorKind::BrokenPipe, "redis connection is disconnected"))
}

fn join_error(e: tokio::task::JoinError) -> RedisError {
    RedisError::from((ErrorKind::ClientError, "command task failed", e.to_string()))
}

/// 异步连接
///
/// 实现 `redis::aio::ConnectionLike`, 可直接用于 `query_async` 与 `AsyncCommands`.
/// 克隆得到的句柄共享底层连接和请求队列.
#[derive(Clone)]
pub struct ReactiveConnection {
    dispatch: Dispatch,
    queue: RequestQueue,
    publish_on_scheduler: bool,
}

impl ReactiveConnection {
    pub(crate) fn managed(conn: ConnectionManager, queue: RequestQueue, accept: bool, spawn: bool) -> Self {
        Self::new(Inner::Managed(conn), queue, accept, spawn)
    }

    pub(crate) fn multiplexed(conn: MultiplexedConnection, queue: RequestQueue, accept: bool, spawn: bool) -> Self {
        Self::new(Inner::Multiplexed(conn), queue, accept, spawn)
    }

    fn new(inner: Inner, queue: RequestQueue, accept: bool, spawn: bool) -> Self {
        let dispatch = Dispatch { inner, link: Arc::default(), accept };
        Self { dispatch, queue, publish_on_scheduler: spawn }
    }

    /// 是否由 `ConnectionManager` 托管(自动重连)
    pub fn is_managed(&self) -> bool { matches!(self.dispatch.inner, Inner::Managed(_)) }

    /// 最近一次请求是否遇到了连接断开, 之后成功的请求会清除该标记
    pub fn is_disconnected(&self) -> bool { self.dispatch.link.disconnected.load(Ordering::Acquire) }

    pub fn queue(&self) -> &RequestQueue { &self.queue }
}

impl ConnectionLike for ReactiveConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        Box::pin(async move {
            let _permit = self.queue.acquire()?;
            let dispatch = self.dispatch.clone();
            if self.publish_on_scheduler {
                let cmd = cmd.clone();
                return tokio::spawn(async move { dispatch.command(&cmd).await }).await.map_err(join_error)?;
            }
            dispatch.command(cmd).await
        })
    }

    fn req_packed_commands<'a>(&'a mut self, cmd: &'a Pipeline, offset: usize, count: usize) -> RedisFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let _permit = self.queue.acquire()?;
            let dispatch = self.dispatch.clone();
            if self.publish_on_scheduler {
                let pipeline = cmd.clone();
                return tokio::spawn(async move { dispatch.pipeline(&pipeline, offset, count).await })
                    .await
                    .map_err(join_error)?;
            }
            dispatch.pipeline(cmd, offset, count).await
        })
    }

    fn get_db(&self) -> i64 {
        match &self.dispatch.inner {
            Inner::Managed(c) => c.get_db(),
            Inner::Multiplexed(c) => c.get_db(),
        }
    }
}

impl fmt::Debug for ReactiveConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveConnection")
            .field("managed", &self.is_managed())
            .field("queue", &self.queue)
            .field("accept_when_disconnected", &self.dispatch.accept)
            .field("disconnected", &self.is_disconnected())
            .field("publish_on_scheduler", &self.publish_on_scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_not_disconnects() {
        assert!(!is_disconnect(&RedisError::from(io::Error::from(io::ErrorKind::TimedOut))));
        assert!(!is_disconnect(&RedisError::from((ErrorKind::ResponseError, "ERR"))));
        assert!(is_disconnect(&RedisError::from(io::Error::from(io::ErrorKind::ConnectionReset))));
        assert!(is_disconnect(&disconnected_error()));
    }

    #[test]
    fn unbounded_queue_never_rejects() {
        let queue = RequestQueue::new(usize::MAX);
        assert!(!queue.is_bounded());
        assert!(queue.acquire().unwrap().is_none());
    }

    #[test]
    fn bounded_queue_rejects_excess_requests() {
        let queue = RequestQueue::new(2);
        let first = queue.acquire().unwrap();
        let _second = queue.acquire().unwrap();

        let err = queue.acquire().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClientError);
        assert!(err.to_string().contains(QUEUE_EXCEEDED));

        drop(first);
        assert_eq!(queue.available(), Some(1));
        assert!(queue.acquire().is_ok());
    }
}
