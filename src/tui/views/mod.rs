pub mod chat;
pub mod faq;
pub mod home;
pub mod overview;
pub mod quiz;
pub mod uploads;
pub mod workspaces;
