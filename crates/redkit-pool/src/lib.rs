mod builder;
mod handler;
mod manager;
mod pool;

pub use builder::*;
pub use handler::*;
pub use manager::*;
pub use pool::*;
pub use r2d2;
