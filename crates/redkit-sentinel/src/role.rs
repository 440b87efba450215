use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumString};

/// 通过哨兵要连接的节点角色
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Display, EnumString, SerializeDisplay, DeserializeFromStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ServerRole {
    #[default]
    Master,
    #[strum(to_string = "replica", serialize = "slave")]
    Replica,
}
