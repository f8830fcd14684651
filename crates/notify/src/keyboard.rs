//! Inline actions attached to delivered listings.
//!
//! Callback data is `fav:<listing_id>` or `hide:<listing_id>`; Telegram caps
//! it at 64 bytes, which hh.ru numeric ids stay far below.

use jobwatch_core::SeenStatus;

use crate::types::{InlineKeyboardButton, InlineKeyboardMarkup};

const FAVORITE_PREFIX: &str = "fav:";
const HIDE_PREFIX: &str = "hide:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingAction {
    Favorite,
    Hide,
}

impl ListingAction {
    /// Status the listing moves to after this action.
    pub fn status(&self) -> SeenStatus {
        match self {
            ListingAction::Favorite => SeenStatus::Favorited,
            ListingAction::Hide => SeenStatus::Hidden,
        }
    }

    /// Toast shown to the user after the action is stored.
    pub fn confirmation(&self) -> &'static str {
        match self {
            ListingAction::Favorite => "Added to favorites",
            ListingAction::Hide => "Hidden",
        }
    }

    pub fn callback_data(&self, listing_id: &str) -> String {
        match self {
            ListingAction::Favorite => format!("{FAVORITE_PREFIX}{listing_id}"),
            ListingAction::Hide => format!("{HIDE_PREFIX}{listing_id}"),
        }
    }

    /// Parse callback data into an action and listing id.
    pub fn parse(data: &str) -> Option<(ListingAction, &str)> {
        let (action, id) = if let Some(id) = data.strip_prefix(FAVORITE_PREFIX) {
            (ListingAction::Favorite, id)
        } else if let Some(id) = data.strip_prefix(HIDE_PREFIX) {
            (ListingAction::Hide, id)
        } else {
            return None;
        };
        (!id.is_empty()).then_some((action, id))
    }
}

fn open_button(url: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::link("🔗 Open", url)
}

/// Keyboard for a freshly delivered listing: favorite, hide, open.
pub fn listing_keyboard(listing_id: &str, url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![
                InlineKeyboardButton::callback("⭐ Favorite", ListingAction::Favorite.callback_data(listing_id)),
                InlineKeyboardButton::callback("🙈 Hide", ListingAction::Hide.callback_data(listing_id)),
            ],
            vec![open_button(url)],
        ],
    }
}

/// Keyboard after an action: favorites keep the hide and open buttons,
/// hidden listings lose their keyboard entirely.
pub fn keyboard_after(action: ListingAction, listing_id: &str, url: Option<&str>) -> Option<InlineKeyboardMarkup> {
    match action {
        ListingAction::Hide => None,
        ListingAction::Favorite => {
            let mut rows = vec![vec![InlineKeyboardButton::callback(
                "🙈 Hide",
                ListingAction::Hide.callback_data(listing_id),
            )]];
            if let Some(url) = url {
                rows.push(vec![open_button(url)]);
            }
            Some(InlineKeyboardMarkup { inline_keyboard: rows })
        }
    }
}
