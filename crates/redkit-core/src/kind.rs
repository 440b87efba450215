use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumIter, EnumString};

/// builder 的种类, 工厂据此分发
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, Display, EnumString, EnumIter, SerializeDisplay, DeserializeFromStr,
)]
pub enum ClientKind {
    /// r2d2 连接池
    #[strum(to_string = "pooled", serialize = "pool", serialize = "jedis", serialize = "jedis-pooled")]
    Pooled,

    /// 单一 `redis::Client` 句柄
    #[strum(to_string = "unified", serialize = "unified-jedis")]
    Unified,

    /// 基于 tokio 的异步连接
    #[strum(to_string = "reactive", serialize = "async", serialize = "lettuce")]
    Reactive,

    #[strum(to_string = "cluster")]
    Cluster,

    #[strum(to_string = "sentinel")]
    Sentinel,
}

impl ClientKind {
    /// 单机(非集群/哨兵)类型
    pub fn is_standalone(&self) -> bool { matches!(self, ClientKind::Pooled | ClientKind::Unified | ClientKind::Reactive) }
}
