use std::ops::Deref;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use redis::{Client, ConnectionInfo};

use crate::manager::RedisConnectionManager;

pub type RedisPooledConnection = PooledConnection<RedisConnectionManager>;

/// 由 [`PooledClientBuilder`](crate::PooledClientBuilder) 构建的连接池
///
/// 解引用为 `r2d2::Pool`, 可直接读取池的各项配置.
#[derive(Clone, Debug)]
pub struct RedisPool {
    pool: Pool<RedisConnectionManager>,
    client: Client,
    max_idle: Option<u32>,
    test_on_check_in: bool,
    block_when_exhausted: bool,
}

impl RedisPool {
    pub(crate) fn new(
        pool: Pool<RedisConnectionManager>,
        client: Client,
        max_idle: Option<u32>,
        test_on_check_in: bool,
        block_when_exhausted: bool,
    ) -> Self {
        Self { pool, client, max_idle, test_on_check_in, block_when_exhausted }
    }

    /// 借出连接
    ///
    /// `block_when_exhausted` 为 `false` 且池已满时立即失败, 否则最多等待
    /// `connection_timeout`.
    pub fn get(&self) -> Result<RedisPooledConnection, r2d2::Error> {
        if self.block_when_exhausted {
            return self.pool.get();
        }
        if let Some(conn) = self.pool.try_get() {
            return Ok(conn);
        }
        if self.pool.state().connections < self.pool.max_size() {
            self.pool.get()
        } else {
            self.pool.get_timeout(Duration::ZERO)
        }
    }

    /// 连接目标
    pub fn connection_info(&self) -> &ConnectionInfo { self.client.get_connection_info() }

    pub fn client(&self) -> &Client { &self.client }

    pub fn max_idle(&self) -> Option<u32> { self.max_idle }

    pub fn test_on_check_in(&self) -> bool { self.test_on_check_in }

    pub fn block_when_exhausted(&self) -> bool { self.block_when_exhausted }

    pub fn into_inner(self) -> Pool<RedisConnectionManager> { self.pool }
}

impl Deref for RedisPool {
    type Target = Pool<RedisConnectionManager>;

    fn deref(&self) -> &Self::Target { &self.pool }
}
