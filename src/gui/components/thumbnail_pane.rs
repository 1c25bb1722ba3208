//! Preview of the video behind the entered URL

use crate::gui::app::{Message, PreviewState};
use crate::gui::theme;
use crate::utils::format::format_clock;
use iced::widget::{column, container, image, row, text, Space};
use iced::{Alignment, Element, Length};

const FRAME_WIDTH: f32 = 240.0;
const FRAME_HEIGHT: f32 = 135.0;

fn frame<'a>(content: Element<'a, Message>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fixed(FRAME_WIDTH))
        .height(Length::Fixed(FRAME_HEIGHT))
        .center_x()
        .center_y()
        .style(iced::theme::Container::Custom(Box::new(theme::ThumbnailFrame)))
        .into()
}

fn placeholder<'a>(label: &str) -> Element<'a, Message> {
    frame(text(label.to_string()).size(13).into())
}

/// Thumbnail on the left, title and details on the right
pub fn thumbnail_pane<'a>(preview: &PreviewState) -> Element<'a, Message> {
    match preview {
        PreviewState::Empty => row![
            placeholder("No preview"),
            text("Paste a link and press Load Preview to see the video here")
                .size(14)
                .style(iced::theme::Text::Color(theme::GRAY_500)),
        ]
        .spacing(20)
        .align_items(Alignment::Center)
        .into(),

        PreviewState::Loading { .. } => row![
            placeholder("Loading..."),
            text("Fetching video information...")
                .size(14)
                .style(iced::theme::Text::Color(theme::GRAY_500)),
        ]
        .spacing(20)
        .align_items(Alignment::Center)
        .into(),

        PreviewState::Failed { error, .. } => row![
            placeholder("No preview"),
            text(error.user_message())
                .size(14)
                .style(iced::theme::Text::Color(theme::DANGER)),
        ]
        .spacing(20)
        .align_items(Alignment::Center)
        .into(),

        PreviewState::Loaded {
            metadata,
            thumbnail,
            ..
        } => {
            let picture = match thumbnail {
                Some(handle) => frame(
                    image(handle.clone())
                        .width(Length::Fill)
                        .height(Length::Fill)
                        .into(),
                ),
                None => placeholder("No thumbnail"),
            };

            let mut details = column![text(metadata.title.clone())
                .size(18)
                .style(iced::theme::Text::Color(theme::TEXT_PRIMARY))]
            .spacing(6);

            if let Some(uploader) = &metadata.uploader {
                details = details.push(
                    text(uploader.clone())
                        .size(13)
                        .style(iced::theme::Text::Color(theme::TEXT_SECONDARY)),
                );
            }

            let mut facts = Vec::new();
            if let Some(secs) = metadata.duration_secs() {
                facts.push(format_clock(secs));
            }
            if let Some(height) = metadata.max_height() {
                facts.push(format!("up to {}p", height));
            }
            if let Some(site) = &metadata.extractor {
                facts.push(site.clone());
            }
            if !facts.is_empty() {
                details = details.push(
                    text(facts.join(" · "))
                        .size(12)
                        .style(iced::theme::Text::Color(theme::GRAY_500)),
                );
            }

            row![picture, details, Space::with_width(Length::Fill)]
                .spacing(20)
                .align_items(Alignment::Center)
                .into()
        }
    }
}
