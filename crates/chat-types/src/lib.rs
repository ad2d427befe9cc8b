pub mod message;
pub mod event;
pub mod api;
pub mod config;
pub mod error;


pub use error::ChatError;
pub type Result<T> = std::result::Result<T, ChatError>;
