use chrono::{DateTime, Utc};
use iced::{
    Element,
    Length::Fill,
    widget::{Column, column, container, image, row, text},
};
use urbaneye_lib::{
    posts::{FeedContent, PostCard, PostsSection},
    repository::storage::Storage,
};

use crate::{components::profile_header::state::remote, icons::icon};

const AUTHOR_AVATAR_SIZE: f32 = 40.0;

/// Render the feed as of `now`. The feed has no interaction, so it produces no messages of its own.
pub fn view<'a, Message: 'static>(
    section: &PostsSection,
    storage: &Storage,
    now: DateTime<Utc>,
) -> Element<'a, Message> {
    let body: Element<'a, Message> = match section.render(now) {
        FeedContent::Placeholder(placeholder) => container(text(placeholder))
            .center_x(Fill)
            .padding(32)
            .into(),
        FeedContent::Cards(cards) => Column::with_children(
            cards
                .into_iter()
                .map(|card| post_card(card, storage)),
        )
        .spacing(16)
        .into(),
    };

    container(column![text(section.heading()).size(24), body].spacing(16))
        .padding(24)
        .width(Fill)
        .style(container::bordered_box)
        .into()
}

fn post_card<'a, Message: 'static>(card: PostCard, storage: &Storage) -> Element<'a, Message> {
    let avatar: Element<'a, Message> =
        match card.author_avatar.as_deref().and_then(|url| remote(url, storage)) {
            Some(handle) => image(handle)
                .width(AUTHOR_AVATAR_SIZE)
                .height(AUTHOR_AVATAR_SIZE)
                .into(),
            None if card.author_initials.is_empty() => container(icon("user"))
                .center(AUTHOR_AVATAR_SIZE)
                .style(container::rounded_box)
                .into(),
            None => container(text(card.author_initials))
                .center(AUTHOR_AVATAR_SIZE)
                .style(container::rounded_box)
                .into(),
        };

    container(
        column![
            row![
                avatar,
                column![text(card.author), text(card.posted).size(12)].spacing(2)
            ]
            .spacing(12),
            text(card.content),
            row![
                row![icon("heart"), text(card.likes)].spacing(4),
                row![icon("comment"), text(card.comments)].spacing(4),
            ]
            .spacing(24),
        ]
        .spacing(12),
    )
    .padding(16)
    .width(Fill)
    .style(container::rounded_box)
    .into()
}
