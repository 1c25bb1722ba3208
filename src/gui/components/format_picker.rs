//! Format and quality dropdowns

use crate::downloader::{OutputFormat, Quality};
use crate::gui::app::Message;
use crate::gui::theme;
use crate::utils::format::format_bytes;
use iced::widget::{column, container, pick_list, row, text};
use iced::{Element, Length};

fn tag<'a>(label: &'static str, content: Element<'a, Message>) -> Element<'a, Message> {
    container(
        column![
            text(label)
                .size(11)
                .style(iced::theme::Text::Color(theme::GRAY_500)),
            content,
        ]
        .spacing(4),
    )
    .padding([8, 12])
    .style(iced::theme::Container::Custom(Box::new(theme::InfoTagStyle)))
    .into()
}

fn fixed_value<'a>(value: String) -> Element<'a, Message> {
    text(value)
        .size(12)
        .style(iced::theme::Text::Color(theme::GRAY_800))
        .into()
}

/// Dropdowns are replaced by plain text while `enabled` is false, so the
/// choices cannot change under a running download.
pub fn format_picker<'a>(
    format: OutputFormat,
    quality: Quality,
    quality_options: Vec<Quality>,
    estimated_size: Option<u64>,
    enabled: bool,
) -> Element<'a, Message> {
    let format_control: Element<'a, Message> = if enabled {
        pick_list(OutputFormat::ALL.to_vec(), Some(format), Message::FormatSelected)
            .text_size(12)
            .padding([6, 10])
            .width(Length::Fixed(110.0))
            .into()
    } else {
        fixed_value(format.to_string())
    };

    // Quality does not apply to audio
    let quality_control: Element<'a, Message> = if format.is_audio_only() {
        fixed_value("Best audio".to_string())
    } else if enabled {
        pick_list(quality_options, Some(quality), Message::QualitySelected)
            .text_size(12)
            .padding([6, 10])
            .width(Length::Fixed(140.0))
            .into()
    } else {
        fixed_value(quality.to_string())
    };

    let size = estimated_size
        .map(|bytes| format!("~{}", format_bytes(bytes)))
        .unwrap_or_else(|| "Unknown".to_string());

    row![
        tag("Format", format_control),
        tag("Quality", quality_control),
        tag("Estimated size", fixed_value(size)),
    ]
    .spacing(12)
    .into()
}
