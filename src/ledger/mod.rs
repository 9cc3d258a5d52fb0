pub mod engine;
pub mod time;

pub use engine::LedgerEngine;
pub use time::relative_time;
