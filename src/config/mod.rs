pub mod layout;
pub mod resolve;
pub mod secrets;
pub mod store;

pub use layout::StackLayout;
pub use store::{ConfigStore, Configuration};
