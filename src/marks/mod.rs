pub mod store;

pub use store::{ImageRect, MarkStore};
