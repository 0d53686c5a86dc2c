//! Bot orchestration.
//!
//! Ties the Matrix client to the command router: every incoming message is
//! handled in its own task, so a slow homeserver or a slow disk never blocks
//! the sync loop. Tasks share the ledger through the [`Commander`], which
//! serializes mutations.

use std::{path::Path, sync::Arc};

use log::{debug, info, warn};

use crate::{
    Args,
    commands::{CommandContext, CommandParseError, CommandResult, Commander},
    config::Config,
    matrix::{IncomingMessage, MatrixClient, UserCredentials},
    notifications::Messenger,
    registrations::{JsonSnapshotStore, Ledger},
};

/// Name of the registration snapshot inside the data directory.
const USERS_FILE: &str = "users.json";

type PorterCommander = Commander<JsonSnapshotStore, MatrixClient>;

/// Context of a single incoming message, moved into its task.
struct MessageContext {
    message: IncomingMessage,
    matrix_client: Arc<MatrixClient>,
    commander: Arc<PorterCommander>,
}

pub struct Bot {
    matrix_client: Arc<MatrixClient>,

    commander: Arc<PorterCommander>,
}

impl Bot {
    /// Loads the ledger from the data directory and logs in to Matrix.
    ///
    /// # Errors
    ///
    /// Fails if the data directory can't be created, the snapshot can't be
    /// read, or the Matrix login fails.
    pub async fn new(config: Config, args: Args) -> Result<Self, anyhow::Error> {
        tokio::fs::create_dir_all(&args.data).await?;

        let ledger = Ledger::load(JsonSnapshotStore::new(Path::new(&args.data).join(USERS_FILE)))
            .await?;
        info!("{} registrations loaded", ledger.len().await);

        let matrix_client = Arc::new(
            MatrixClient::new(&UserCredentials {
                user_id: config.matrix.user_id,
                password: config.matrix.password,
            })
            .await?,
        );

        if config.registration.admin_id.is_none() {
            info!("no admin configured, listusers is disabled and no notification will be sent");
        }

        let commander = Arc::new(Commander::new(
            ledger,
            Arc::clone(&matrix_client),
            config.registration.admin_id,
            config.links,
        ));

        Ok(Bot {
            matrix_client,
            commander,
        })
    }

    /// Runs the Matrix sync loop until it fails.
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let matrix_client = Arc::clone(&self.matrix_client);
        let commander = Arc::clone(&self.commander);

        let on_message = move |message: IncomingMessage| {
            Self::handle_matrix_message(MessageContext {
                message,
                matrix_client: Arc::clone(&matrix_client),
                commander: Arc::clone(&commander),
            })
        };

        self.matrix_client.sync(on_message).await
    }

    fn handle_matrix_message(ctx: MessageContext) {
        tokio::spawn(async move {
            let IncomingMessage {
                body,
                room_id,
                sender_id,
                event_id,
                display_name,
            } = ctx.message;

            let command = match ctx.commander.parse(&body) {
                Ok(command) => command,
                Err(e) => match e {
                    CommandParseError::NotForBot => return,
                    CommandParseError::InvalidCommand(message) => {
                        ctx.matrix_client
                            .send_reply(&room_id, &sender_id, &event_id, &message)
                            .await;
                        return;
                    }
                },
            };

            debug!("{} in {} runs {:?}", sender_id, room_id, command);

            let command_context = CommandContext {
                room_id: room_id.clone(),
                user_id: sender_id.clone(),
                display_name,
            };

            let Some(command_result) = ctx.commander.parse_command(&command, &command_context).await
            else {
                return;
            };

            let CommandResult {
                response,
                private,
                event,
            } = command_result;

            if private {
                // Matrix has no ephemeral messages, private replies go to a direct room
                if let Err(e) = ctx.matrix_client.send_direct(&sender_id, &response).await {
                    warn!("failed to send private reply to {}: {}", sender_id, e);
                }
            } else {
                ctx.matrix_client
                    .send_reply(&room_id, &sender_id, &event_id, &response)
                    .await;
            }

            // The owner hears about the change only once the user has their reply
            if let Some(event) = event {
                ctx.commander.notify(&event).await;
            }
        });
    }
}
