use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use r2d2::event::{AcquireEvent, CheckinEvent, CheckoutEvent, ReleaseEvent, TimeoutEvent};
use r2d2::{HandleError, HandleEvent};
use redis::RedisError;

/// 空闲连接计数
///
/// r2d2 不向连接管理器暴露空闲数量, 这里通过池事件推算:
/// 新建和归还使空闲数加一, 借出和销毁使其减一.
#[derive(Debug, Default)]
pub struct IdleTracker {
    max_idle: Option<u32>,
    idle: AtomicI64,
}

impl IdleTracker {
    pub fn new(max_idle: Option<u32>) -> Self { Self { max_idle, idle: AtomicI64::new(0) } }

    pub fn idle(&self) -> i64 { self.idle.load(Ordering::Acquire) }

    pub fn max_idle(&self) -> Option<u32> { self.max_idle }

    /// 归还后空闲数是否超过上限
    pub fn exceeded(&self) -> bool { self.max_idle.is_some_and(|max| self.idle() > i64::from(max)) }

    fn incr(&self) { self.idle.fetch_add(1, Ordering::AcqRel); }

    fn decr(&self) { self.idle.fetch_sub(1, Ordering::AcqRel); }
}

/// 以 tracing 记录连接池内部错误
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorHandler;

impl HandleError<RedisError> for TracingErrorHandler {
    fn handle_error(&self, error: RedisError) { tracing::error!(error = %error, "redis pool failed to open connection"); }
}

/// 连接池事件处理, 维护空闲计数并按需输出事件日志
#[derive(Debug)]
pub struct TracingEventHandler {
    tracker: Arc<IdleTracker>,
    logging: bool,
}

impl TracingEventHandler {
    pub fn new(tracker: Arc<IdleTracker>, logging: bool) -> Self { Self { tracker, logging } }
}

impl HandleEvent for TracingEventHandler {
    fn handle_acquire(&self, event: AcquireEvent) {
        self.tracker.incr();
        if self.logging {
            tracing::debug!(connection = event.connection_id(), "redis pool opened connection");
        }
    }

    fn handle_release(&self, event: ReleaseEvent) {
        self.tracker.decr();
        if self.logging {
            tracing::debug!(
                connection = event.connection_id(),
                age_ms = event.age().as_millis() as u64,
                "redis pool closed connection"
            );
        }
    }

    fn handle_checkout(&self, event: CheckoutEvent) {
        self.tracker.decr();
        if self.logging {
            tracing::trace!(
                connection = event.connection_id(),
                wait_ms = event.duration().as_millis() as u64,
                "redis pool checked out connection"
            );
        }
    }

    fn handle_timeout(&self, event: TimeoutEvent) {
        if self.logging {
            tracing::warn!(timeout_ms = event.timeout().as_millis() as u64, "redis pool checkout timed out");
        }
    }

    fn handle_checkin(&self, event: CheckinEvent) {
        self.tracker.incr();
        if self.logging {
            tracing::trace!(
                connection = event.connection_id(),
                held_ms = event.duration().as_millis() as u64,
                "redis pool checked in connection"
            );
        }
    }
}
