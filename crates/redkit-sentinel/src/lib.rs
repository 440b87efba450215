mod builder;
mod client;
mod role;

pub use builder::*;
pub use client::*;
pub use role::*;
