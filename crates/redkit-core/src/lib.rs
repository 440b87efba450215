mod builder;
mod connection;
mod error;
mod kind;
mod load;

pub use builder::*;
pub use connection::*;
pub use error::*;
pub use kind::*;
pub use load::*;
pub use redkit_derive::With;
pub use {redis, serde_with};
