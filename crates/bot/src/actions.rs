//! Inline button presses on delivered listings.

use tracing::{info, warn};

use jobwatch_notify::keyboard::keyboard_after;
use jobwatch_notify::types::CallbackQuery;
use jobwatch_notify::ListingAction;

use crate::poller::Poller;

/// Result of handling one callback, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied(ListingAction),
    UnknownListing,
    Malformed,
    Failed,
}

/// Apply a favorite/hide press: store the new status, toast the user, and
/// swap the message keyboard.
pub async fn on_action(poller: &Poller, callback: &CallbackQuery) -> ActionOutcome {
    let notifier = poller.notifier();
    let data = callback.data.as_deref().unwrap_or_default();

    let Some((action, listing_id)) = ListingAction::parse(data) else {
        warn!(data, "unrecognized callback data");
        ack(poller, &callback.id, "Unknown action").await;
        return ActionOutcome::Malformed;
    };

    let updated = match poller.store().update_status(listing_id, action.status()).await {
        Ok(updated) => updated,
        Err(e) => {
            warn!(listing_id, error = %e, "failed to update listing status");
            ack(poller, &callback.id, "Something went wrong, try again").await;
            return ActionOutcome::Failed;
        }
    };

    if !updated {
        ack(poller, &callback.id, "This listing is no longer tracked").await;
        return ActionOutcome::UnknownListing;
    }

    info!(listing_id, status = %action.status(), user_id = callback.from.id, "listing status changed");
    ack(poller, &callback.id, action.confirmation()).await;

    if let Some(message) = &callback.message {
        let url = match poller.store().get(listing_id).await {
            Ok(record) => record.map(|r| r.url),
            Err(e) => {
                warn!(listing_id, error = %e, "failed to load listing for keyboard");
                None
            }
        };
        let markup = keyboard_after(action, listing_id, url.as_deref());
        if let Err(e) = notifier
            .edit_actions(message.chat.id, message.message_id, markup)
            .await
        {
            warn!(listing_id, error = %e, "failed to update message keyboard");
        }
    }

    ActionOutcome::Applied(action)
}

async fn ack(poller: &Poller, callback_id: &str, text: &str) {
    if let Err(e) = poller.notifier().acknowledge(callback_id, text).await {
        warn!(callback_id, error = %e, "failed to answer callback query");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::tests::{config, listing, poller, MockNotifier, MockSource};
    use jobwatch_core::SeenStatus;
    use jobwatch_notify::types::{Chat, Message, User};
    use std::sync::Arc;

    fn callback(data: &str, with_message: bool) -> CallbackQuery {
        CallbackQuery {
            id: "cb-1".to_string(),
            from: User { id: 5, username: None },
            message: with_message.then(|| Message {
                message_id: 31,
                chat: Chat { id: 5, kind: Some("private".to_string()) },
                from: None,
                text: None,
            }),
            data: Some(data.to_string()),
        }
    }

    async fn setup() -> (crate::poller::Poller, Arc<MockNotifier>) {
        let notifier = Arc::new(MockNotifier::default());
        let poller = poller(config(Some(5)), Arc::new(MockSource::default()), notifier.clone()).await;
        poller
            .store()
            .mark_seen(&listing("42", None), SeenStatus::Delivered)
            .await
            .unwrap();
        (poller, notifier)
    }

    #[tokio::test]
    async fn favorite_updates_status_and_keyboard() {
        let (poller, notifier) = setup().await;

        let outcome = on_action(&poller, &callback("fav:42", true)).await;
        assert_eq!(outcome, ActionOutcome::Applied(ListingAction::Favorite));

        let record = poller.store().get("42").await.unwrap().unwrap();
        assert_eq!(record.status, SeenStatus::Favorited);

        assert_eq!(
            notifier.acks.lock().unwrap()[0],
            ("cb-1".to_string(), "Added to favorites".to_string())
        );
        let edits = notifier.edits.lock().unwrap();
        let (chat, message_id, markup) = &edits[0];
        assert_eq!((*chat, *message_id), (5, 31));
        let markup = markup.as_ref().unwrap();
        assert_eq!(markup.inline_keyboard[0][0].callback_data.as_deref(), Some("hide:42"));
        assert_eq!(markup.inline_keyboard[1][0].url.as_deref(), Some("https://hh.ru/vacancy/42"));
    }

    #[tokio::test]
    async fn hide_removes_keyboard() {
        let (poller, notifier) = setup().await;

        on_action(&poller, &callback("hide:42", true)).await;

        assert_eq!(poller.store().get("42").await.unwrap().unwrap().status, SeenStatus::Hidden);
        assert_eq!(notifier.edits.lock().unwrap()[0].2, None);
    }

    #[tokio::test]
    async fn unknown_listing_is_acknowledged() {
        let (poller, notifier) = setup().await;

        let outcome = on_action(&poller, &callback("fav:999", true)).await;
        assert_eq!(outcome, ActionOutcome::UnknownListing);
        assert!(notifier.edits.lock().unwrap().is_empty());
        assert_eq!(notifier.acks.lock().unwrap().len(), 1);
        assert!(!poller.store().has_seen("999").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_data_changes_nothing() {
        let (poller, notifier) = setup().await;

        let outcome = on_action(&poller, &callback("delete:42", true)).await;
        assert_eq!(outcome, ActionOutcome::Malformed);
        assert_eq!(poller.store().get("42").await.unwrap().unwrap().status, SeenStatus::Delivered);
        assert_eq!(notifier.acks.lock().unwrap()[0].1, "Unknown action");
    }

    #[tokio::test]
    async fn missing_message_skips_keyboard_edit() {
        let (poller, notifier) = setup().await;

        let outcome = on_action(&poller, &callback("fav:42", false)).await;
        assert_eq!(outcome, ActionOutcome::Applied(ListingAction::Favorite));
        assert!(notifier.edits.lock().unwrap().is_empty());
    }
}
