mod factory;

pub use factory::*;
pub use redkit_core::{
    ClientKind, ConnectionConfig, Error, NodeAddress, RedisClientBuilder, Result, load, load_optional,
};
pub use {redis, tracing};

pub mod pool {
    pub use redkit_pool::*;
}

pub mod unified {
    pub use redkit_unified::*;
}

pub mod reactive {
    pub use redkit_reactive::*;
}

#[cfg(feature = "cluster")]
pub mod cluster {
    pub use redkit_cluster::*;
}

#[cfg(feature = "sentinel")]
pub mod sentinel {
    pub use redkit_sentinel::*;
}

pub mod derive {
    pub use redkit_core::With;
}
