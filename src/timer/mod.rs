pub mod flash;
pub mod inactivity;

pub use flash::{FlashScheduler, FlashStatus, FlashTiming};
pub use inactivity::InactivityTracker;
