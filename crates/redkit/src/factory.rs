use std::any::{TypeId, type_name};
use std::fmt;
use std::str::FromStr;

use redkit_core::{ClientKind, ConnectionConfig, RedisClientBuilder, Result, UnsupportedClientTypeSnafu};
#[cfg(feature = "cluster")]
use redkit_cluster::{ClusterClient, ClusterClientBuilder};
use redkit_pool::{PooledClientBuilder, RedisPool};
use redkit_reactive::{ReactiveClient, ReactiveClientBuilder};
#[cfg(feature = "sentinel")]
use redkit_sentinel::{SentinelClient, SentinelClientBuilder};
use redkit_unified::{UnifiedClient, UnifiedClientBuilder};
use serde::{Deserialize, Serialize};
use snafu::OptionExt;

/// 各类 builder 的统一入口
///
/// ```no_run
/// use redkit::{RedisClientBuilder, RedisClientBuilderFactory};
///
/// let pool = RedisClientBuilderFactory::pooled().with_host("localhost").with_max_size(100).build().unwrap();
/// let client = RedisClientBuilderFactory::builder_for_name("unified").unwrap().with_port(6380).build().unwrap();
/// ```
pub struct RedisClientBuilderFactory;

impl RedisClientBuilderFactory {
    pub fn pooled() -> PooledClientBuilder { PooledClientBuilder::new() }

    pub fn unified() -> UnifiedClientBuilder { UnifiedClientBuilder::new() }

    pub fn reactive() -> ReactiveClientBuilder { ReactiveClientBuilder::new() }

    #[cfg(feature = "cluster")]
    pub fn cluster() -> ClusterClientBuilder { ClusterClientBuilder::new() }

    #[cfg(feature = "sentinel")]
    pub fn sentinel() -> SentinelClientBuilder { SentinelClientBuilder::new() }

    /// 按种类创建 builder, 未启用对应 feature 的种类返回 `UnsupportedClientType`
    pub fn builder(kind: ClientKind) -> Result<AnyClientBuilder> {
        let builder = match kind {
            ClientKind::Pooled => AnyClientBuilder::Pooled(Self::pooled()),
            ClientKind::Unified => AnyClientBuilder::Unified(Self::unified()),
            ClientKind::Reactive => AnyClientBuilder::Reactive(Self::reactive()),
            #[cfg(feature = "cluster")]
            ClientKind::Cluster => AnyClientBuilder::Cluster(Self::cluster()),
            #[cfg(feature = "sentinel")]
            ClientKind::Sentinel => AnyClientBuilder::Sentinel(Self::sentinel()),
            #[allow(unreachable_patterns)]
            other => return UnsupportedClientTypeSnafu { name: other.to_string() }.fail(),
        };
        Ok(builder)
    }

    /// 按名称创建 builder, 名称及别名见 [`ClientKind`]
    pub fn builder_for_name(name: &str) -> Result<AnyClientBuilder> {
        let kind = ClientKind::from_str(name).ok().context(UnsupportedClientTypeSnafu { name })?;
        Self::builder(kind)
    }

    /// 按期望的客户端类型创建 builder
    ///
    /// 支持 [`RedisPool`], [`UnifiedClient`], [`ReactiveClient`], 以及启用 feature 后的集群与哨兵客户端.
    pub fn builder_of<T: 'static>() -> Result<AnyClientBuilder> {
        let kind = client_kind_of::<T>().context(UnsupportedClientTypeSnafu { name: type_name::<T>() })?;
        Self::builder(kind)
    }

    #[cfg(feature = "cluster")]
    pub fn cluster_builder_of<T: 'static>() -> Result<ClusterClientBuilder> {
        match client_kind_of::<T>() {
            Some(ClientKind::Cluster) => Ok(Self::cluster()),
            _ => UnsupportedClientTypeSnafu { name: type_name::<T>() }.fail(),
        }
    }

    #[cfg(feature = "sentinel")]
    pub fn sentinel_builder_of<T: 'static>() -> Result<SentinelClientBuilder> {
        match client_kind_of::<T>() {
            Some(ClientKind::Sentinel) => Ok(Self::sentinel()),
            _ => UnsupportedClientTypeSnafu { name: type_name::<T>() }.fail(),
        }
    }
}

fn client_kind_of<T: 'static>() -> Option<ClientKind> {
    let id = TypeId::of::<T>();
    if id == TypeId::of::<RedisPool>() {
        return Some(ClientKind::Pooled);
    }
    if id == TypeId::of::<UnifiedClient>() {
        return Some(ClientKind::Unified);
    }
    if id == TypeId::of::<ReactiveClient>() {
        return Some(ClientKind::Reactive);
    }
    #[cfg(feature = "cluster")]
    if id == TypeId::of::<ClusterClient>() {
        return Some(ClientKind::Cluster);
    }
    #[cfg(feature = "sentinel")]
    if id == TypeId::of::<SentinelClient>() {
        return Some(ClientKind::Sentinel);
    }
    None
}

/// 运行时选定种类的 builder, 可从配置中按 `kind` 字段加载
///
/// ```toml
/// [redis]
/// kind = "pooled"
/// host = "10.0.0.1"
/// max_size = 32
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind")]
pub enum AnyClientBuilder {
    #[serde(rename = "pooled", alias = "pool", alias = "jedis", alias = "jedis-pooled")]
    Pooled(PooledClientBuilder),
    #[serde(rename = "unified", alias = "unified-jedis")]
    Unified(UnifiedClientBuilder),
    #[serde(rename = "reactive", alias = "async", alias = "lettuce")]
    Reactive(ReactiveClientBuilder),
    #[cfg(feature = "cluster")]
    #[serde(rename = "cluster")]
    Cluster(ClusterClientBuilder),
    #[cfg(feature = "sentinel")]
    #[serde(rename = "sentinel")]
    Sentinel(SentinelClientBuilder),
}

impl AnyClientBuilder {
    pub fn as_pooled_mut(&mut self) -> Option<&mut PooledClientBuilder> {
        match self {
            AnyClientBuilder::Pooled(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_unified_mut(&mut self) -> Option<&mut UnifiedClientBuilder> {
        match self {
            AnyClientBuilder::Unified(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_reactive_mut(&mut self) -> Option<&mut ReactiveClientBuilder> {
        match self {
            AnyClientBuilder::Reactive(b) => Some(b),
            _ => None,
        }
    }
}

impl From<PooledClientBuilder> for AnyClientBuilder {
    fn from(builder: PooledClientBuilder) -> Self { AnyClientBuilder::Pooled(builder) }
}

impl From<UnifiedClientBuilder> for AnyClientBuilder {
    fn from(builder: UnifiedClientBuilder) -> Self { AnyClientBuilder::Unified(builder) }
}

impl From<ReactiveClientBuilder> for AnyClientBuilder {
    fn from(builder: ReactiveClientBuilder) -> Self { AnyClientBuilder::Reactive(builder) }
}

impl RedisClientBuilder for AnyClientBuilder {
    type Client = AnyClient;

    fn kind(&self) -> ClientKind {
        match self {
            AnyClientBuilder::Pooled(b) => b.kind(),
            AnyClientBuilder::Unified(b) => b.kind(),
            AnyClientBuilder::Reactive(b) => b.kind(),
            #[cfg(feature = "cluster")]
            AnyClientBuilder::Cluster(b) => b.kind(),
            #[cfg(feature = "sentinel")]
            AnyClientBuilder::Sentinel(b) => b.kind(),
        }
    }

    fn connection(&self) -> &ConnectionConfig {
        match self {
            AnyClientBuilder::Pooled(b) => b.connection(),
            AnyClientBuilder::Unified(b) => b.connection(),
            AnyClientBuilder::Reactive(b) => b.connection(),
            #[cfg(feature = "cluster")]
            AnyClientBuilder::Cluster(b) => b.connection(),
            #[cfg(feature = "sentinel")]
            AnyClientBuilder::Sentinel(b) => b.connection(),
        }
    }

    fn connection_mut(&mut self) -> &mut ConnectionConfig {
        match self {
            AnyClientBuilder::Pooled(b) => b.connection_mut(),
            AnyClientBuilder::Unified(b) => b.connection_mut(),
            AnyClientBuilder::Reactive(b) => b.connection_mut(),
            #[cfg(feature = "cluster")]
            AnyClientBuilder::Cluster(b) => b.connection_mut(),
            #[cfg(feature = "sentinel")]
            AnyClientBuilder::Sentinel(b) => b.connection_mut(),
        }
    }

    fn build(&self) -> Result<AnyClient> {
        let client = match self {
            AnyClientBuilder::Pooled(b) => AnyClient::Pooled(b.build()?),
            AnyClientBuilder::Unified(b) => AnyClient::Unified(b.build()?),
            AnyClientBuilder::Reactive(b) => AnyClient::Reactive(b.build()?),
            #[cfg(feature = "cluster")]
            AnyClientBuilder::Cluster(b) => AnyClient::Cluster(b.build()?),
            #[cfg(feature = "sentinel")]
            AnyClientBuilder::Sentinel(b) => AnyClient::Sentinel(b.build()?),
        };
        Ok(client)
    }
}

/// [`AnyClientBuilder`] 构建出的客户端
pub enum AnyClient {
    Pooled(RedisPool),
    Unified(UnifiedClient),
    Reactive(ReactiveClient),
    #[cfg(feature = "cluster")]
    Cluster(ClusterClient),
    #[cfg(feature = "sentinel")]
    Sentinel(SentinelClient),
}

impl AnyClient {
    pub fn kind(&self) -> ClientKind {
        match self {
            AnyClient::Pooled(_) => ClientKind::Pooled,
            AnyClient::Unified(_) => ClientKind::Unified,
            AnyClient::Reactive(_) => ClientKind::Reactive,
            #[cfg(feature = "cluster")]
            AnyClient::Cluster(_) => ClientKind::Cluster,
            #[cfg(feature = "sentinel")]
            AnyClient::Sentinel(_) => ClientKind::Sentinel,
        }
    }

    pub fn into_pooled(self) -> Option<RedisPool> {
        match self {
            AnyClient::Pooled(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_unified(self) -> Option<UnifiedClient> {
        match self {
            AnyClient::Unified(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_reactive(self) -> Option<ReactiveClient> {
        match self {
            AnyClient::Reactive(c) => Some(c),
            _ => None,
        }
    }

    #[cfg(feature = "cluster")]
    pub fn into_cluster(self) -> Option<ClusterClient> {
        match self {
            AnyClient::Cluster(c) => Some(c),
            _ => None,
        }
    }

    #[cfg(feature = "sentinel")]
    pub fn into_sentinel(self) -> Option<SentinelClient> {
        match self {
            AnyClient::Sentinel(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Debug for AnyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_tuple("AnyClient").field(&self.kind()).finish() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_of_known_client_types() {
        assert_eq!(client_kind_of::<RedisPool>(), Some(ClientKind::Pooled));
        assert_eq!(client_kind_of::<UnifiedClient>(), Some(ClientKind::Unified));
        assert_eq!(client_kind_of::<ReactiveClient>(), Some(ClientKind::Reactive));
        assert_eq!(client_kind_of::<String>(), None);
        assert_eq!(client_kind_of::<redis::Client>(), None);
    }

    #[test]
    fn builder_matches_requested_kind() {
        for kind in [ClientKind::Pooled, ClientKind::Unified, ClientKind::Reactive] {
            assert_eq!(RedisClientBuilderFactory::builder(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn mutable_access_to_flavor_options() {
        let mut builder = RedisClientBuilderFactory::builder(ClientKind::Pooled).unwrap();
        builder.as_pooled_mut().unwrap().max_size = 42;
        assert!(builder.as_unified_mut().is_none());
        assert!(builder.as_reactive_mut().is_none());

        let pool = builder.build().unwrap().into_pooled().unwrap();
        assert_eq!(pool.max_size(), 42);
    }
}
