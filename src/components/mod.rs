pub mod app;
pub mod viewport;
