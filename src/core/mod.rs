pub mod chat;
pub mod content;
pub mod logging;
pub mod quiz;
pub mod section_nav;
pub mod staging;
pub mod study_guide;
pub mod upload;
