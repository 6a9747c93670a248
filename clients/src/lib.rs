pub mod court_listener;
pub mod federal_register;
pub mod html;

pub use court_listener::CourtListenerClient;
pub use federal_register::{FederalRegisterClient, TextCache};
