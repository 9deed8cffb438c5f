pub mod config;
pub mod env;
pub mod fs;
pub mod progress;

pub use config::*;
pub use env::*;
pub use fs::*;
pub use progress::*;
