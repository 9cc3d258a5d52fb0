pub mod controller;
pub mod event;
pub mod state;
pub mod view;

pub use controller::SessionController;
pub use event::{Change, SessionEvent};
pub use state::Session;
pub use view::{RecordView, ViewState};
