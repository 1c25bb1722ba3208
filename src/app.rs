//! Application initialization and main entry point

use crate::gui::ReelgrabApp;
use crate::utils::AppSettings;
use iced::{Application, Settings, Size};

/// Open the main window and block until it is closed
pub fn run(settings: AppSettings) -> iced::Result {
    ReelgrabApp::run(Settings {
        flags: settings,
        window: iced::window::Settings {
            size: Size::new(900.0, 720.0),
            min_size: Some(Size::new(640.0, 560.0)),
            ..Default::default()
        },
        antialiasing: true,
        ..Default::default()
    })
}
