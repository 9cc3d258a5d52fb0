pub mod queue;

pub use queue::{Dismissal, NotificationQueue};
