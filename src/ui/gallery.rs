use iced::widget::image::Handle;
use iced::widget::{
    button, column, container, horizontal_space, image, mouse_area, progress_bar, row, scrollable,
    text, Column, Row,
};
use iced::{Alignment, ContentFit, Element, Length};
use std::collections::HashMap;

use photo_gallery::grid::{GridController, Tile, TileId, TileState};
use photo_gallery::state::data::Collection;

use crate::{Message, GRID_PADDING};

/// Scrollable holding the masonry grid, restored after the lightbox closes
pub fn scroll_id() -> scrollable::Id {
    scrollable::Id::new("gallery-grid")
}

/// Everything the gallery page shows
pub struct GalleryView<'a> {
    pub collection: Option<&'a Collection>,
    pub grid: Option<&'a GridController>,
    pub thumbnails: &'a HashMap<TileId, Handle>,
    pub status: &'a str,
    pub export_running: bool,
    pub export_progress: f32,
    pub link_notice: Option<&'a str>,
    pub confirm_leave: bool,
}

pub fn view(page: GalleryView<'_>) -> Element<'_, Message> {
    let title = page
        .collection
        .map(|c| c.display_title())
        .unwrap_or_default();

    let mut toolbar = row![
        button("← Back")
            .on_press(Message::RequestLeave)
            .style(button::secondary)
            .padding(8),
        text(title).size(28),
        horizontal_space(),
    ]
    .spacing(16)
    .align_y(Alignment::Center);

    if page.collection.is_some_and(|c| c.download_link.is_some()) {
        toolbar = toolbar.push(
            button("Open full-resolution download")
                .on_press(Message::CopyDownloadLink)
                .style(button::secondary)
                .padding(8),
        );
    }

    let export: Element<'_, Message> = if page.export_running {
        progress_bar(0.0..=1.0, page.export_progress)
            .width(Length::Fixed(200.0))
            .height(Length::Fixed(12.0))
            .into()
    } else {
        button("Download All")
            .on_press(Message::ExportAll)
            .padding(8)
            .into()
    };
    toolbar = toolbar.push(export);

    let mut header = column![toolbar].spacing(8);

    if page.confirm_leave {
        header = header.push(
            container(
                row![
                    text("If you go back you will have to re-enter the passcode.").size(14),
                    horizontal_space(),
                    button("Stay")
                        .on_press(Message::StayInGallery)
                        .style(button::secondary),
                    button("Go back")
                        .on_press(Message::ConfirmLeave)
                        .style(button::danger),
                ]
                .spacing(12)
                .align_y(Alignment::Center),
            )
            .padding(10)
            .style(container::rounded_box),
        );
    }

    if let Some(link) = page.link_notice {
        header = header.push(text(format!("Copied to clipboard: {}", link)).size(13));
    }

    let footer = match page.grid {
        Some(grid) => {
            let cursor = grid.cursor();
            format!(
                "{} · showing {} of {}",
                page.status, cursor.rendered_count, cursor.total
            )
        }
        None => page.status.to_string(),
    };
    header = header.push(text(footer).size(13));

    let body: Element<'_, Message> = match page.grid {
        Some(grid) => scrollable(container(masonry(grid, page.thumbnails)).padding(GRID_PADDING))
            .id(scroll_id())
            .on_scroll(Message::Scrolled)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => container(text("Loading photos..."))
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into(),
    };

    column![container(header).padding([12, 16]), body]
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Columns of tiles as packed by the grid's masonry layout
fn masonry<'a>(grid: &'a GridController, thumbnails: &'a HashMap<TileId, Handle>) -> Element<'a, Message> {
    let config = grid.masonry();
    let layout = grid.layout();

    let columns = layout.columns().into_iter().map(|ids| -> Element<'a, Message> {
        let tiles = ids.into_iter().filter_map(|id| {
            let tile = grid.tile(id)?;
            let height = layout
                .span(id)
                .map(|span| span.bottom - span.top)
                .unwrap_or_else(|| tile.height(config.column_width));
            Some(tile_view(tile, thumbnails.get(&id), config.column_width, height))
        });

        Column::with_children(tiles)
            .spacing(config.gutter)
            .width(Length::Fixed(config.column_width))
            .into()
    });

    Row::with_children(columns).spacing(config.gutter).into()
}

fn tile_view<'a>(tile: &Tile, thumbnail: Option<&Handle>, width: f32, height: f32) -> Element<'a, Message> {
    let body: Element<'a, Message> = match (tile.state, thumbnail) {
        (TileState::Loaded, Some(handle)) => image(handle.clone())
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .content_fit(ContentFit::Cover)
            .into(),
        _ if tile.shows_skeleton() => container(text(""))
            .center_x(Length::Fixed(width))
            .center_y(Length::Fixed(height))
            .style(container::rounded_box)
            .into(),
        _ => {
            let label = if tile.is_degraded() {
                format!("⚠ {}", tile.photo.filename)
            } else {
                String::new()
            };
            container(text(label).size(12))
                .center_x(Length::Fixed(width))
                .center_y(Length::Fixed(height))
                .style(container::bordered_box)
                .into()
        }
    };

    mouse_area(body).on_press(Message::OpenLightbox(tile.id)).into()
}
