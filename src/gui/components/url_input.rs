//! URL input component

use crate::gui::app::Message;
use crate::gui::theme;
use iced::widget::{button, column, row, text, text_input, tooltip};
use iced::{Alignment, Element, Length};

/// URL field with Paste, Clear and Load Preview buttons, plus an optional
/// validation message underneath
pub fn url_input<'a>(
    value: &str,
    error_message: Option<&str>,
    is_loading: bool,
    editable: bool,
) -> Element<'a, Message> {
    let mut input = text_input("Paste video URL here...", value)
        .padding(15)
        .width(Length::Fill)
        .style(if error_message.is_some() {
            iced::theme::TextInput::Custom(Box::new(theme::InputErrorStyle))
        } else {
            iced::theme::TextInput::Custom(Box::new(theme::InputStyle))
        });
    if editable {
        input = input
            .on_input(Message::UrlInputChanged)
            .on_submit(Message::LoadPreview);
    }

    let can_preview = editable && !is_loading && !value.trim().is_empty();

    let input_row = row![
        input,
        tooltip(
            button(text("Paste").size(14))
                .on_press_maybe(editable.then_some(Message::PasteFromClipboard))
                .padding([8, 12])
                .style(iced::theme::Button::Custom(Box::new(theme::IconButton))),
            "Paste from clipboard",
            tooltip::Position::Bottom,
        ),
        button(text("Clear").size(14))
            .on_press_maybe(editable.then_some(Message::ClearUrlInput))
            .padding([8, 12])
            .style(iced::theme::Button::Custom(Box::new(theme::IconButton))),
        button(text(if is_loading { "Loading..." } else { "Load Preview" }).size(14))
            .on_press_maybe(can_preview.then_some(Message::LoadPreview))
            .padding([10, 16])
            .style(iced::theme::Button::Custom(Box::new(theme::SecondaryButton))),
    ]
    .spacing(12)
    .align_items(Alignment::Center);

    match error_message {
        Some(error) => column![
            input_row,
            text(error.to_string())
                .size(14)
                .style(iced::theme::Text::Color(theme::DANGER)),
        ]
        .spacing(8)
        .into(),
        None => input_row.into(),
    }
}
