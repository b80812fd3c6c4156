pub mod app;
pub mod theme;
pub mod trail;
pub mod window;
