pub mod context;
pub mod setup;
pub mod ui;
