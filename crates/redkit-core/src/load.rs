use config::Config;
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use crate::error::{ConfigSnafu, Result};

/// 从 `config` 配置中读取指定 key 下的 builder
///
/// ```toml
/// [redis]
/// host = "10.0.0.1"
/// max_size = 32
/// ```
pub fn load<B: DeserializeOwned>(cfg: &Config, key: &str) -> Result<B> { cfg.get::<B>(key).context(ConfigSnafu { key }) }

/// 配置中没有该 key 时返回 `None`
pub fn load_optional<B: DeserializeOwned>(cfg: &Config, key: &str) -> Result<Option<B>> {
    match cfg.get::<B>(key) {
        Ok(b) => Ok(Some(b)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(source) => Err(source).context(ConfigSnafu { key }),
    }
}
