use std::sync::Arc;
use std::time::Duration;

use redis::{Client, Connection, ConnectionLike, RedisError};

use crate::handler::IdleTracker;

/// r2d2 连接管理器
///
/// 与 redis 自带的 r2d2 支持相比, 额外应用连接/读写超时与客户端名称,
/// 并在归还时执行可选的 PING 检查和空闲上限检查.
#[derive(Debug)]
pub struct RedisConnectionManager {
    client: Client,
    connection_timeout: Option<Duration>,
    socket_timeout: Option<Duration>,
    client_name: Option<String>,
    test_on_check_in: bool,
    tracker: Arc<IdleTracker>,
}

impl RedisConnectionManager {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            connection_timeout: None,
            socket_timeout: None,
            client_name: None,
            test_on_check_in: false,
            tracker: Arc::new(IdleTracker::default()),
        }
    }

    pub fn with_connection_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_socket_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.socket_timeout = timeout;
        self
    }

    pub fn with_client_name(mut self, name: Option<String>) -> Self {
        self.client_name = name;
        self
    }

    pub fn with_test_on_check_in(mut self, test: bool) -> Self {
        self.test_on_check_in = test;
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<IdleTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn client(&self) -> &Client { &self.client }

    fn ping(conn: &mut Connection) -> Result<(), RedisError> { redis::cmd("PING").query::<()>(conn) }
}

impl r2d2::ManageConnection for RedisConnectionManager {
    type Connection = Connection;
    type Error = RedisError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let mut conn = match self.connection_timeout {
            Some(timeout) => self.client.get_connection_with_timeout(timeout)?,
            None => self.client.get_connection()?,
        };
        conn.set_read_timeout(self.socket_timeout)?;
        conn.set_write_timeout(self.socket_timeout)?;
        if let Some(name) = &self.client_name {
            redis::cmd("CLIENT").arg("SETNAME").arg(name).query::<()>(&mut conn)?;
        }
        Ok(conn)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> { Self::ping(conn) }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        if !conn.is_open() {
            return true;
        }
        if self.test_on_check_in && Self::ping(conn).is_err() {
            return true;
        }
        self.tracker.exceeded()
    }
}
