pub mod guard;
pub mod journal;
pub mod pool;
pub mod writes;

pub use pool::create_pool;
