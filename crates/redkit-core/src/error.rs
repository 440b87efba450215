use config::ConfigError;
use redis::RedisError;
use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// 工厂无法为请求的类型找到对应的 builder
    #[snafu(display("Unsupported Redis client type: {name}"))]
    UnsupportedClientType {
        name: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// 底层 redis 库拒绝了最终配置
    #[snafu(display("{source}"))]
    Redis {
        source: RedisError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("ConfigError: key={key}, {source}"))]
    Config {
        key: String,
        source: ConfigError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("InvalidConfig: {message}"))]
    InvalidConfig {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
