//! Matrix sync loop and event handlers.
//!
//! Only messages received after the first sync are dispatched, so the history
//! the bot missed while offline is never answered. Invitations received while
//! offline are still accepted.

use anyhow::Result;
use std::sync::Arc;

use log::{error, info, warn};
use matrix_sdk::{
    Client, Room, RoomState,
    config::SyncSettings,
    ruma::{
        api::client::filter::FilterDefinition,
        events::room::{
            member::StrippedRoomMemberEvent,
            message::{MessageType, OriginalSyncRoomMessageEvent},
        },
    },
};
use tokio::time::{Duration, sleep};

use crate::matrix::IncomingMessage;

/// Longest wait between two retries, in seconds.
const MAX_RETRY_DELAY: u64 = 3600;

pub struct MatrixSync {
    client: Client,
}

impl MatrixSync {
    pub fn new(client: &Client) -> Self {
        MatrixSync {
            client: client.to_owned(),
        }
    }

    /// Runs the sync loop, calling `on_message` for every new text message.
    ///
    /// Only returns if the sync loop stops with an error.
    pub async fn sync<F>(&self, on_message: F) -> Result<()>
    where
        F: Fn(IncomingMessage) + Send + Sync + 'static,
    {
        info!("start syncing");

        // Auto join rooms when invited
        self.client.add_event_handler(auto_join_rooms);

        // Enable room members lazy-loading
        // See <https://spec.matrix.org/v1.6/client-server-api/#lazy-loading-room-members>.
        let filter = FilterDefinition::with_lazy_loading();
        let mut sync_settings = SyncSettings::default().filter(filter.into());

        // First sync to skip the history and only get the pending invitations
        let mut delay = 2;
        loop {
            match self.client.sync_once(sync_settings.clone()).await {
                Ok(response) => {
                    sync_settings = sync_settings.token(response.next_batch);
                    break;
                }
                Err(error) => {
                    error!("an error occurred during initial sync: {error}, retrying in {delay}s");
                    sleep(Duration::from_secs(delay)).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                }
            }
        }

        let on_message = Arc::new(on_message);

        // Listen to incoming room messages. Because we are listening after the sync_once, we only get new messages.
        self.client.add_event_handler({
            let on_message = Arc::clone(&on_message);
            move |event: OriginalSyncRoomMessageEvent, room: Room| {
                let on_message = Arc::clone(&on_message);
                async move { on_room_message(event, room, on_message.as_ref()).await }
            }
        });

        self.client.sync(sync_settings).await?;

        Ok(())
    }
}

async fn auto_join_rooms(room_member: StrippedRoomMemberEvent, client: Client, room: Room) {
    let Some(user_id) = client.user_id() else {
        warn!("could not get user id from client");
        return;
    };

    // Ignore if the invite is not for us
    if room_member.state_key != user_id {
        return;
    }

    tokio::spawn(async move {
        info!("auto joining room {}", room.room_id());
        let mut delay = 2;

        while let Err(err) = room.join().await {
            // Synapse can send the invite before the invited user is able to join
            // See https://github.com/matrix-org/synapse/issues/4345
            error!(
                "failed to join room {} ({err:?}), retrying in {delay}s",
                room.room_id()
            );

            sleep(Duration::from_secs(delay)).await;
            delay *= 2;

            if delay > MAX_RETRY_DELAY {
                error!("can't join room {} ({err:?})", room.room_id());
                return;
            }
        }
        info!("successfully joined room {}", room.room_id());
    });
}

async fn on_room_message<F>(event: OriginalSyncRoomMessageEvent, room: Room, on_message: &F)
where
    F: Fn(IncomingMessage) + Send + Sync + 'static,
{
    // Ignore messages from non-joined rooms
    if room.state() != RoomState::Joined {
        return;
    }

    // Ignore our own messages
    if event.sender == room.own_user_id() {
        return;
    }

    // Only handle text messages
    let MessageType::Text(text_content) = event.content.msgtype else {
        return;
    };

    let display_name = match room.get_member_no_sync(&event.sender).await {
        Ok(Some(member)) => member
            .display_name()
            .map(str::to_owned)
            .unwrap_or_else(|| event.sender.to_string()),
        Ok(None) => event.sender.to_string(),
        Err(e) => {
            warn!("failed to get member {}: {:?}", event.sender, e);
            event.sender.to_string()
        }
    };

    on_message(IncomingMessage {
        body: text_content.body,
        room_id: room.room_id().to_string(),
        sender_id: event.sender.to_string(),
        event_id: event.event_id.to_string(),
        display_name,
    });
}
