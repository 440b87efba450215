mod behavior;
mod builder;
mod client;
mod connection;

pub use behavior::*;
pub use builder::*;
pub use client::*;
pub use connection::*;
