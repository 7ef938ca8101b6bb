use iced::widget::image::Handle;
use iced::widget::{button, column, container, horizontal_space, image, row, text};
use iced::{Alignment, ContentFit, Element, Length};

use photo_gallery::state::data::PhotoRef;

use crate::Message;

pub struct LightboxView<'a> {
    /// Photo on screen; changes together with the image
    pub photo: Option<&'a PhotoRef>,
    /// 1-based
    pub position: usize,
    pub total: usize,
    pub image: Option<&'a Handle>,
    pub error: Option<&'a str>,
}

pub fn view(lightbox: LightboxView<'_>) -> Element<'_, Message> {
    let filename = lightbox
        .photo
        .map(|p| p.filename.clone())
        .unwrap_or_default();

    let header = row![
        text(format!("{} / {}", lightbox.position, lightbox.total)).size(16),
        text(filename).size(16),
        horizontal_space(),
        button("Save photo")
            .on_press(Message::SavePhoto)
            .style(button::secondary)
            .padding(8),
        button("Close").on_press(Message::CloseLightbox).padding(8),
    ]
    .spacing(16)
    .align_y(Alignment::Center);

    let stage: Element<'_, Message> = match (lightbox.image, lightbox.error) {
        (Some(handle), _) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .content_fit(ContentFit::Contain)
            .into(),
        (None, Some(error)) => text(format!("⚠ {}", error)).size(14).into(),
        (None, None) => text("Loading...").size(14).into(),
    };

    let body = row![
        button(text("‹").size(32))
            .on_press(Message::Previous)
            .style(button::text),
        container(stage)
            .center_x(Length::Fill)
            .center_y(Length::Fill),
        button(text("›").size(32))
            .on_press(Message::Next)
            .style(button::text),
    ]
    .spacing(8)
    .align_y(Alignment::Center)
    .height(Length::Fill);

    column![header, body]
        .spacing(12)
        .padding(16)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
