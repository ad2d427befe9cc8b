//! egui presentation layer for the chat client.
//!
//! Panels are plain functions over `UiState`; they never call the network.
//! User intents are returned to the app, which hands them to the session.

pub mod highlight;
pub mod markdown;
pub mod panels;
pub mod state;
pub mod theme;

#[cfg(test)]
mod tests;
