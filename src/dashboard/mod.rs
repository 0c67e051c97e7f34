pub mod manager;
pub mod types;

pub use manager::Dashboard;
pub use types::*;
