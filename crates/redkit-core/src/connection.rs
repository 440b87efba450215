use std::time::Duration;

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use redkit_derive::With;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_DATABASE: i64 = 0;

/// 所有 builder 共用的连接配置
///
/// 超时为 `None` 时沿用 redis 库自身的默认行为(不设超时).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, With)]
#[serde(default)]
pub struct ConnectionConfig {
    /// 服务器地址, 不做格式校验
    #[with(into)]
    pub host: String,

    /// 服务器端口
    pub port: u16,

    /// AUTH 密码, 为空时不发送 AUTH
    #[with(into)]
    pub password: Option<String>,

    /// 逻辑数据库编号
    #[serde(alias = "db")]
    pub database: i64,

    /// 建立连接的超时时间
    #[serde(rename = "connection_timeout_ms")]
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub connection_timeout: Option<Duration>,

    /// 读写(或等待响应)的超时时间
    #[serde(rename = "socket_timeout_ms")]
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub socket_timeout: Option<Duration>,

    /// 是否使用 TLS
    #[serde(alias = "tls")]
    pub ssl: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            database: DEFAULT_DATABASE,
            connection_timeout: None,
            socket_timeout: None,
            ssl: false,
        }
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self { Self { host: host.into(), port, ..Default::default() } }

    /// `host:port`, 用于日志
    pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

    pub fn connection_addr(&self) -> ConnectionAddr {
        if self.ssl {
            ConnectionAddr::TcpTls { host: self.host.clone(), port: self.port, insecure: false, tls_params: None }
        } else {
            ConnectionAddr::Tcp(self.host.clone(), self.port)
        }
    }

    pub fn redis_connection_info(&self) -> RedisConnectionInfo {
        RedisConnectionInfo { db: self.database, password: self.password.clone(), ..Default::default() }
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo { addr: self.connection_addr(), redis: self.redis_connection_info() }
    }
}

/// 集群或哨兵中的单个节点地址
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self { Self { host: host.into(), port } }

    /// 以 `base` 的认证、数据库与 TLS 设置连接该节点
    pub fn connection_info(&self, base: &ConnectionConfig) -> ConnectionInfo {
        ConnectionConfig { host: self.host.clone(), port: self.port, ..base.clone() }.connection_info()
    }
}

impl std::fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}:{}", self.host, self.port) }
}

impl From<&ConnectionConfig> for ConnectionInfo {
    fn from(cfg: &ConnectionConfig) -> Self { cfg.connection_info() }
}
