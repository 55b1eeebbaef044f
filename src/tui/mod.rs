//! Terminal UI: Elm-style event loop, views, and shared widgets.

pub mod app;
pub mod events;
pub mod layout;
pub mod picker;
pub mod services;
pub mod sidebar;
pub mod theme;
pub mod views;
pub mod widgets;
