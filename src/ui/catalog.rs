use iced::widget::image::Handle;
use iced::widget::{button, column, container, horizontal_space, image, row, scrollable, text, text_input, Column, Row};
use iced::{Alignment, ContentFit, Element, Length};
use std::collections::HashMap;

use photo_gallery::state::access::Gate;
use photo_gallery::state::data::Collection;
use photo_gallery::state::library::Library;

use crate::Message;

const CARD_WIDTH: f32 = 300.0;
const COVER_HEIGHT: f32 = 200.0;
const CARDS_PER_ROW: usize = 3;

/// Collection cards, three per row
pub fn view<'a>(
    library: &'a Library,
    covers: &'a HashMap<String, Handle>,
    status: &'a str,
) -> Element<'a, Message> {
    let rows = library.collections().chunks(CARDS_PER_ROW).map(|chunk| -> Element<'a, Message> {
        Row::with_children(chunk.iter().map(|c| card(c, covers.get(&c.name))))
            .spacing(20)
            .into()
    });

    let content = column![
        text("Photo Gallery").size(40),
        text(status).size(14),
        Column::with_children(rows).spacing(20),
    ]
    .spacing(20)
    .padding(40)
    .align_x(Alignment::Center);

    scrollable(container(content).center_x(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn card<'a>(collection: &'a Collection, cover: Option<&Handle>) -> Element<'a, Message> {
    let cover: Element<'a, Message> = match cover {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(CARD_WIDTH))
            .height(Length::Fixed(COVER_HEIGHT))
            .content_fit(ContentFit::Cover)
            .into(),
        None => container(text(""))
            .center_x(Length::Fixed(CARD_WIDTH))
            .center_y(Length::Fixed(COVER_HEIGHT))
            .style(container::rounded_box)
            .into(),
    };

    let lock = if collection.is_open() { "" } else { "🔒" };
    let mut body = column![
        cover,
        row![
            text(collection.display_title()).size(20),
            horizontal_space(),
            text(lock)
        ]
        .align_y(Alignment::Center),
    ]
    .spacing(8)
    .width(Length::Fixed(CARD_WIDTH));

    if let Some(description) = &collection.description {
        body = body.push(text(description.as_str()).size(13));
    }

    button(body)
        .on_press(Message::OpenCollection(collection.name.clone()))
        .style(button::text)
        .into()
}

/// Passcode prompt of a locked collection
pub fn gate(gate: &Gate, title: String) -> Element<'_, Message> {
    let mut content = column![
        text(title).size(32),
        text("This gallery is protected. Enter the passcode to continue.").size(14),
        text_input("Passcode", &gate.input)
            .on_input(Message::PasscodeChanged)
            .on_submit(Message::SubmitPasscode)
            .secure(true)
            .padding(10)
            .width(Length::Fixed(320.0)),
    ]
    .spacing(16)
    .align_x(Alignment::Center);

    if let Some(error) = &gate.error {
        content = content.push(text(error.as_str()).size(14).style(text::danger));
    }

    content = content.push(
        row![
            button("Back")
                .on_press(Message::CancelGate)
                .style(button::secondary)
                .padding(10),
            button("Unlock").on_press(Message::SubmitPasscode).padding(10),
        ]
        .spacing(12),
    );

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
