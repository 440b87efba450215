use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumString};

/// 连接断开期间收到命令时的处理方式
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Display, EnumString, SerializeDisplay, DeserializeFromStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DisconnectedBehavior {
    /// 开启自动重连时接受, 否则拒绝
    #[default]
    Default,

    /// 等待重连后重新发送一次
    AcceptCommands,

    /// 立即返回连接错误
    RejectCommands,
}

impl DisconnectedBehavior {
    pub fn accepts_commands(&self, auto_reconnect: bool) -> bool {
        match self {
            DisconnectedBehavior::Default => auto_reconnect,
            DisconnectedBehavior::AcceptCommands => true,
            DisconnectedBehavior::RejectCommands => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn default_follows_auto_reconnect() {
        assert!(DisconnectedBehavior::Default.accepts_commands(true));
        assert!(!DisconnectedBehavior::Default.accepts_commands(false));
        assert!(DisconnectedBehavior::AcceptCommands.accepts_commands(false));
        assert!(!DisconnectedBehavior::RejectCommands.accepts_commands(true));
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(DisconnectedBehavior::AcceptCommands.to_string(), "accept_commands");
        assert_eq!(DisconnectedBehavior::from_str("REJECT_COMMANDS"), Ok(DisconnectedBehavior::RejectCommands));
        assert!(DisconnectedBehavior::from_str("drop").is_err());
    }
}
