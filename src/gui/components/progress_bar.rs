//! Progress bar component

use crate::downloader::{ProgressEvent, ProgressStatus};
use crate::gui::app::{DownloadState, Message};
use crate::gui::theme;
use crate::utils::format::{format_bytes, format_duration, format_speed};
use iced::widget::{column, progress_bar as iced_progress_bar, row, text, Space};
use iced::{Element, Length};

/// Bar plus two caption lines: status on the left, numbers on the right
pub fn progress_bar<'a>(state: &DownloadState) -> Element<'a, Message> {
    let (fraction, style) = match state {
        DownloadState::Finished { .. } => (
            1.0,
            iced::theme::ProgressBar::Custom(Box::new(theme::ProgressBarCompleted)),
        ),
        DownloadState::Failed { .. } => (
            1.0,
            iced::theme::ProgressBar::Custom(Box::new(theme::ProgressBarFailed)),
        ),
        DownloadState::Running { latest, .. } => (
            latest.as_ref().map_or(0.0, ProgressEvent::fraction),
            iced::theme::ProgressBar::Custom(Box::new(theme::ProgressBarStyle)),
        ),
        DownloadState::Idle => (
            0.0,
            iced::theme::ProgressBar::Custom(Box::new(theme::ProgressBarStyle)),
        ),
    };

    let bar = iced_progress_bar(0.0..=1.0, fraction)
        .height(Length::Fixed(10.0))
        .style(style);

    let (status, details) = match state {
        DownloadState::Idle => ("Ready".to_string(), String::new()),
        DownloadState::Running { latest: None, .. } => ("Starting...".to_string(), String::new()),
        DownloadState::Running {
            latest: Some(event),
            ..
        } => (status_line(event), progress_caption(event)),
        DownloadState::Finished { path } => (
            "Completed".to_string(),
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
        DownloadState::Failed { error } => ("Failed".to_string(), error.user_message()),
    };

    column![
        bar,
        row![
            text(status)
                .size(13)
                .style(iced::theme::Text::Color(theme::TEXT_PRIMARY)),
            Space::with_width(Length::Fill),
            text(details)
                .size(12)
                .style(iced::theme::Text::Color(theme::TEXT_SECONDARY)),
        ],
    ]
    .spacing(6)
    .into()
}

fn status_line(event: &ProgressEvent) -> String {
    match &event.status {
        ProgressStatus::Downloading if event.total_bytes.is_some() => {
            format!("Downloading {:.0}%", event.fraction() * 100.0)
        }
        status => format!("{}...", status.label()),
    }
}

/// `12.0 MB of 48.0 MB · 2.5 MB/s · 14s remaining`
pub fn progress_caption(event: &ProgressEvent) -> String {
    if event.status != ProgressStatus::Downloading {
        return String::new();
    }

    let mut parts = Vec::new();
    match event.total_bytes {
        Some(total) => parts.push(format!(
            "{} of {}",
            format_bytes(event.downloaded_bytes),
            format_bytes(total)
        )),
        None => parts.push(format_bytes(event.downloaded_bytes)),
    }
    if let Some(speed) = event.speed {
        parts.push(format_speed(speed));
    }
    match event.eta() {
        Some(eta) if eta.as_secs() == 0 => parts.push("Almost done...".to_string()),
        Some(eta) => parts.push(format!("{} remaining", format_duration(eta))),
        None => {}
    }
    parts.join(" · ")
}
