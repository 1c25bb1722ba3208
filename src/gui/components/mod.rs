//! GUI components

pub mod format_picker;
pub mod progress_bar;
pub mod thumbnail_pane;
pub mod url_input;

// Re-export for convenience
pub use format_picker::format_picker;
pub use progress_bar::progress_bar;
pub use thumbnail_pane::thumbnail_pane;
pub use url_input::url_input;
