//! Matrix client wrapper.
//!
//! Wraps [`matrix_sdk::Client`] with the few operations the bot needs: the sync
//! loop, replies in rooms and direct messages.

use anyhow::Context;
use log::{debug, error, info};
use matrix_sdk::{
    Client, Room,
    ruma::{
        EventId, OwnedUserId, RoomId, UserId,
        events::room::message::{
            AddMentions, ForwardThread, ReplyMetadata, RoomMessageEventContent,
        },
    },
};

use crate::{
    matrix::{IncomingMessage, UserCredentials, sync::MatrixSync},
    notifications::Messenger,
};

/// Logged in Matrix account of the bot.
pub struct MatrixClient {
    matrix_sync: MatrixSync,
    client: Client,
}

impl MatrixClient {
    /// Logs in with `user_credentials`.
    ///
    /// The homeserver is discovered from the server name of the user ID.
    ///
    /// # Errors
    ///
    /// Fails if the user ID is malformed, the homeserver can't be reached or
    /// the credentials are refused.
    pub async fn new(user_credentials: &UserCredentials) -> Result<Self, anyhow::Error> {
        info!(
            "setting up matrix client for user {}",
            user_credentials.user_id
        );

        let porter: OwnedUserId = user_credentials
            .user_id
            .clone()
            .try_into()
            .context("invalid matrix user id")?;
        let client = Client::builder()
            .server_name(porter.server_name())
            .build()
            .await?;

        debug!("matrix client created");

        client
            .matrix_auth()
            .login_username(&porter, &user_credentials.password)
            .initial_device_display_name("porter bot")
            .send()
            .await?;

        // Set display name
        client.account().set_display_name(Some("Porter")).await?;

        info!("matrix client setup complete");

        let matrix_sync = MatrixSync::new(&client);

        Ok(MatrixClient {
            matrix_sync,
            client,
        })
    }

    /// Syncs with the homeserver until an unrecoverable error occurs.
    pub async fn sync<F>(&self, on_message: F) -> Result<(), anyhow::Error>
    where
        F: Fn(IncomingMessage) + Send + Sync + 'static,
    {
        match self.matrix_sync.sync(on_message).await {
            Ok(_) => info!("matrix sync ended successfully"),
            Err(e) => {
                error!("matrix sync ended with error: {:?}", e);
                return Err(e);
            }
        }

        Ok(())
    }

    /// Replies to `event_id`, sent by `sender_id` in `room_id`.
    ///
    /// Errors are logged, a lost reply is not retried.
    pub async fn send_reply(&self, room_id: &str, sender_id: &str, event_id: &str, body: &str) {
        let (sender, event) = match (UserId::parse(sender_id), EventId::parse(event_id)) {
            (Ok(sender), Ok(event)) => (sender, event),
            _ => {
                error!("can't reply to event {} of {}", event_id, sender_id);
                return;
            }
        };

        let content = RoomMessageEventContent::text_markdown(body).make_reply_to(
            ReplyMetadata::new(&event, &sender, None),
            ForwardThread::No,
            AddMentions::No,
        );

        let Some(room) = self.get_room(room_id) else {
            error!("can't reply in unknown room {}", room_id);
            return;
        };
        if let Err(e) = room.send(content).await {
            error!("failed to send message: {:?}", e);
        }
    }

    fn get_room(&self, room_id: &str) -> Option<Room> {
        let room_id = RoomId::parse(room_id).ok()?;
        self.client.get_room(&room_id)
    }

    /// Returns the direct room shared with `user_id`, creating it if needed.
    async fn get_or_create_dm(&self, user_id: &UserId) -> Result<Room, anyhow::Error> {
        if let Some(room) = self.client.get_dm_room(user_id) {
            return Ok(room);
        }

        debug!("creating direct room with {}", user_id);
        let room = self.client.create_dm(user_id).await?;
        Ok(room)
    }
}

impl Messenger for MatrixClient {
    async fn send_direct(&self, user_id: &str, body: &str) -> Result<(), anyhow::Error> {
        let user_id = UserId::parse(user_id).context("invalid recipient")?;
        let room = self.get_or_create_dm(&user_id).await?;

        room.send(RoomMessageEventContent::text_markdown(body)).await?;
        debug!("sent direct message to {}", user_id);

        Ok(())
    }
}
