//! UI layer for the desktop GUI: the app shell and its four views.

pub mod app;

pub use app::DesktopGuiApp;
