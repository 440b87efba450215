use std::time::Duration;

use crate::connection::ConnectionConfig;
use crate::error::Result;
use crate::kind::ClientKind;

/// 所有 Redis 客户端 builder 的公共接口
///
/// setter 消耗并返回 builder 以支持链式调用. `build` 只借用 builder,
/// 因此同一个 builder 可以继续修改后再次构建.
pub trait RedisClientBuilder: Sized {
    /// `build` 产出的客户端句柄
    type Client;

    fn kind(&self) -> ClientKind;

    fn connection(&self) -> &ConnectionConfig;

    fn connection_mut(&mut self) -> &mut ConnectionConfig;

    #[must_use]
    fn with_host(mut self, host: impl Into<String>) -> Self {
        self.connection_mut().host = host.into();
        self
    }

    /// 端口范围由类型保证, 连通性交给 redis 库
    #[must_use]
    fn with_port(mut self, port: u16) -> Self {
        self.connection_mut().port = port;
        self
    }

    #[must_use]
    fn with_password(mut self, password: impl Into<String>) -> Self {
        self.connection_mut().password = Some(password.into());
        self
    }

    #[must_use]
    fn with_database(mut self, database: i64) -> Self {
        self.connection_mut().database = database;
        self
    }

    #[must_use]
    fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_mut().connection_timeout = Some(timeout);
        self
    }

    #[must_use]
    fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.connection_mut().socket_timeout = Some(timeout);
        self
    }

    #[must_use]
    fn with_ssl(mut self, ssl: bool) -> Self {
        self.connection_mut().ssl = ssl;
        self
    }

    /// 用整份连接配置替换当前配置
    #[must_use]
    fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        *self.connection_mut() = connection;
        self
    }

    /// 构建客户端, 仅在 redis 库拒绝配置时失败
    fn build(&self) -> Result<Self::Client>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        connection: ConnectionConfig,
    }

    impl RedisClientBuilder for Recording {
        type Client = ConnectionConfig;

        fn kind(&self) -> ClientKind { ClientKind::Unified }

        fn connection(&self) -> &ConnectionConfig { &self.connection }

        fn connection_mut(&mut self) -> &mut ConnectionConfig { &mut self.connection }

        fn build(&self) -> Result<Self::Client> { Ok(self.connection.clone()) }
    }

    #[test]
    fn setters_chain_and_record_values() {
        let built = Recording::default()
            .with_host("cache.local")
            .with_port(6381)
            .with_password("pw")
            .with_database(5)
            .with_connection_timeout(Duration::from_millis(5000))
            .with_socket_timeout(Duration::from_millis(3000))
            .with_ssl(true)
            .build()
            .unwrap();

        assert_eq!(built.host, "cache.local");
        assert_eq!(built.port, 6381);
        assert_eq!(built.password.as_deref(), Some("pw"));
        assert_eq!(built.database, 5);
        assert_eq!(built.connection_timeout, Some(Duration::from_millis(5000)));
        assert_eq!(built.socket_timeout, Some(Duration::from_millis(3000)));
        assert!(built.ssl);
    }

    #[test]
    fn build_leaves_builder_reusable() {
        let builder = Recording::default().with_port(7000);
        let first = builder.build().unwrap();

        let builder = builder.with_port(7001);
        let second = builder.build().unwrap();

        assert_eq!(first.port, 7000);
        assert_eq!(second.port, 7001);
    }

    #[test]
    fn with_connection_replaces_everything() {
        let builder = Recording::default().with_password("old").with_connection(ConnectionConfig::new("other", 1));
        assert_eq!(builder.connection(), &ConnectionConfig::new("other", 1));
    }
}
