mod builder;
mod client;

pub use builder::*;
pub use client::*;
