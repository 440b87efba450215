use config::{Config, File, FileFormat};
use redkit::pool::RedisPool;
use redkit::redis;
use redkit::reactive::ReactiveClient;
use redkit::unified::UnifiedClient;
use redkit::{AnyClient, AnyClientBuilder, ClientKind, Error, RedisClientBuilder, RedisClientBuilderFactory};
use redkit_testkit::FakeRedis;

#[test]
fn test_pooled_example_configuration() {
    let pool = RedisClientBuilderFactory::pooled()
        .with_host("localhost")
        .with_port(6379)
        .with_max_size(100)
        .with_min_idle(0)
        .build()
        .unwrap();

    assert_eq!(pool.max_size(), 100);
    assert_eq!(pool.connection_info().addr.to_string(), "localhost:6379");
}

#[test]
fn test_builder_for_every_supported_type() {
    let pooled = RedisClientBuilderFactory::builder_of::<RedisPool>().unwrap();
    assert_eq!(pooled.kind(), ClientKind::Pooled);
    assert!(matches!(pooled.with_min_idle_zero().build().unwrap(), AnyClient::Pooled(_)));

    let unified = RedisClientBuilderFactory::builder_of::<UnifiedClient>().unwrap();
    assert_eq!(unified.kind(), ClientKind::Unified);
    assert!(matches!(unified.build().unwrap(), AnyClient::Unified(_)));

    let reactive = RedisClientBuilderFactory::builder_of::<ReactiveClient>().unwrap();
    assert_eq!(reactive.kind(), ClientKind::Reactive);
    assert!(matches!(reactive.build().unwrap(), AnyClient::Reactive(_)));
}

#[test]
fn test_unsupported_type_is_rejected() {
    let err = RedisClientBuilderFactory::builder_of::<String>().unwrap_err();
    match err {
        Error::UnsupportedClientType { name, .. } => assert!(name.contains("String"), "{name}"),
        other => panic!("unexpected error: {other}"),
    }

    let err = RedisClientBuilderFactory::builder_of::<redis::Client>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedClientType { .. }));
}

#[test]
fn test_builder_for_name_accepts_aliases() {
    for (name, kind) in [
        ("pooled", ClientKind::Pooled),
        ("jedis", ClientKind::Pooled),
        ("unified-jedis", ClientKind::Unified),
        ("lettuce", ClientKind::Reactive),
    ] {
        assert_eq!(RedisClientBuilderFactory::builder_for_name(name).unwrap().kind(), kind);
    }

    let err = RedisClientBuilderFactory::builder_for_name("memcached").unwrap_err();
    assert!(matches!(err, Error::UnsupportedClientType { ref name, .. } if name == "memcached"));
}

#[test]
fn test_dispatched_builder_connects() {
    let server = FakeRedis::start().unwrap();
    let client = RedisClientBuilderFactory::builder(ClientKind::Unified)
        .unwrap()
        .with_host(server.host())
        .with_port(server.port())
        .with_database(3)
        .build()
        .unwrap()
        .into_unified()
        .unwrap();

    let mut conn = client.get_connection().unwrap();
    let pong: String = redis::cmd("PING").query(&mut conn).unwrap();
    assert_eq!(pong, "PONG");
    assert_eq!(server.clients()[0].db, 3);
}

#[test]
fn test_load_builder_kind_from_config() {
    let cfg = Config::builder()
        .add_source(File::from_str(
            r#"
            [redis]
            kind = "lettuce"
            host = "10.1.1.1"
            port = 6390
            auto_reconnect = false
            request_queue_size = 128
            "#,
            FileFormat::Toml,
        ))
        .build()
        .unwrap();

    let builder: AnyClientBuilder = redkit::load(&cfg, "redis").unwrap();
    assert_eq!(builder.kind(), ClientKind::Reactive);
    assert_eq!(builder.connection().host, "10.1.1.1");

    let client = builder.build().unwrap().into_reactive().unwrap();
    assert!(!client.options().auto_reconnect);
    assert_eq!(client.options().request_queue_size, 128);
}

#[test]
fn test_setters_after_build_affect_next_build() {
    let builder = RedisClientBuilderFactory::unified().with_port(7000);
    let first = builder.build().unwrap();
    let second = builder.with_port(7001).build().unwrap();

    assert_eq!(first.connection_info().addr.to_string(), "127.0.0.1:7000");
    assert_eq!(second.connection_info().addr.to_string(), "127.0.0.1:7001");
}

trait MinIdleZero {
    fn with_min_idle_zero(self) -> Self;
}

impl MinIdleZero for AnyClientBuilder {
    fn with_min_idle_zero(mut self) -> Self {
        if let Some(pooled) = self.as_pooled_mut() {
            pooled.min_idle = Some(0);
        }
        self
    }
}

#[cfg(feature = "cluster")]
#[test]
fn test_cluster_builder_of() {
    use redkit::cluster::ClusterClient;

    let builder = RedisClientBuilderFactory::cluster_builder_of::<ClusterClient>().unwrap();
    assert!(builder.add_node("127.0.0.1", 7000).build().is_ok());
    assert!(RedisClientBuilderFactory::cluster_builder_of::<RedisPool>().is_err());
}

#[cfg(feature = "sentinel")]
#[test]
fn test_sentinel_builder_of() {
    use redkit::sentinel::SentinelClient;

    let builder = RedisClientBuilderFactory::sentinel_builder_of::<SentinelClient>().unwrap();
    assert!(builder.with_master_name("mymaster").build().is_ok());
    assert!(RedisClientBuilderFactory::sentinel_builder_of::<UnifiedClient>().is_err());
}
