//! Main view implementation - Light Theme

use crate::downloader::OutputFormat;
use crate::gui::app::{DownloadState, Message, PreviewState, ReelgrabApp};
use crate::gui::components::{format_picker, progress_bar, thumbnail_pane, url_input};
use crate::gui::theme;
use iced::widget::{button, column, container, row, scrollable, text, text_input, Column, Space};
use iced::{Alignment, Element, Length};

fn banner<'a>(message: String, style: theme::BannerStyle, on_dismiss: Message) -> Element<'a, Message> {
    container(
        row![
            text(message).size(14).width(Length::Fill),
            button(text("Dismiss").size(12))
                .on_press(on_dismiss)
                .padding([4, 10])
                .style(iced::theme::Button::Custom(Box::new(theme::IconButton))),
        ]
        .spacing(12)
        .align_items(Alignment::Center),
    )
    .padding([10, 16])
    .width(Length::Fill)
    .style(iced::theme::Container::Custom(Box::new(style)))
    .into()
}

/// Create the main view
pub fn main_view(app: &ReelgrabApp) -> Element<'_, Message> {
    let running = app.download.is_running();

    let mut banners = Column::new().spacing(8);
    for (index, warning) in app.warnings.iter().enumerate() {
        banners = banners.push(banner(
            warning.clone(),
            theme::BannerStyle::Warning,
            Message::DismissWarning(index),
        ));
    }
    if let Some(error) = &app.error_banner {
        banners = banners.push(banner(
            error.clone(),
            theme::BannerStyle::Error,
            Message::DismissError,
        ));
    }

    let (quality_options, estimated_size) = match &app.preview {
        PreviewState::Loaded { metadata, .. } => (
            metadata.quality_options(),
            metadata.estimated_size(app.format, app.quality),
        ),
        _ => (crate::downloader::Quality::ALL.to_vec(), None),
    };

    let mut output_input = text_input("Output folder", &app.output_dir)
        .padding(10)
        .width(Length::Fill)
        .style(iced::theme::TextInput::Custom(Box::new(theme::InputStyle)));
    if !running {
        output_input = output_input.on_input(Message::OutputDirChanged);
    }

    let output_row = row![
        text("Save to")
            .size(13)
            .style(iced::theme::Text::Color(theme::GRAY_600)),
        output_input,
        button(text("Browse").size(14))
            .on_press_maybe((!running).then_some(Message::BrowseOutputDir))
            .padding([10, 16])
            .style(iced::theme::Button::Custom(Box::new(theme::SecondaryButton))),
    ]
    .spacing(12)
    .align_items(Alignment::Center);

    let mut actions = row![Space::with_width(Length::Fill)]
        .spacing(12)
        .align_items(Alignment::Center);
    if let DownloadState::Finished { .. } = app.download {
        actions = actions.push(
            button(text("Open Folder").size(14))
                .on_press(Message::OpenFolder)
                .padding([12, 20])
                .style(iced::theme::Button::Custom(Box::new(theme::SecondaryButton))),
        );
    }
    if running {
        actions = actions.push(
            button(text("Cancel").size(14))
                .on_press(Message::CancelPressed)
                .padding([12, 20])
                .style(iced::theme::Button::Custom(Box::new(theme::DestructiveButton))),
        );
    }
    let download_label = match app.format {
        OutputFormat::Mp4 => "Download MP4",
        OutputFormat::Mp3 => "Download MP3",
    };
    actions = actions.push(
        button(text(if running { "Downloading..." } else { download_label }).size(16))
            .on_press_maybe(app.can_download().then_some(Message::DownloadPressed))
            .padding([16, 32])
            .style(iced::theme::Button::Custom(Box::new(theme::PrimaryButton))),
    );

    let hero_section = container(
        column![
            text("Download Video")
                .size(30)
                .style(iced::theme::Text::Color(theme::GRAY_800)),
            url_input(
                &app.url_input,
                app.url_error.as_deref(),
                app.preview.is_loading(),
                !running,
            ),
            thumbnail_pane(&app.preview),
            format_picker(
                app.format,
                app.quality,
                quality_options,
                estimated_size,
                !running,
            ),
            output_row,
            progress_bar(&app.download),
            actions,
        ]
        .spacing(20),
    )
    .padding(32)
    .width(Length::Fill)
    .style(iced::theme::Container::Custom(Box::new(theme::GlassContainer)));

    let status = text(app.status_message.clone())
        .size(13)
        .style(iced::theme::Text::Color(theme::TEXT_SECONDARY));

    let content = column![banners, hero_section, status]
        .spacing(20)
        .width(Length::Fill)
        .padding([32, 32, 32, 32]);

    container(
        scrollable(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(iced::theme::Scrollable::Custom(Box::new(theme::ScrollableStyle))),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .style(iced::theme::Container::Custom(Box::new(theme::MainGradientContainer)))
    .into()
}
