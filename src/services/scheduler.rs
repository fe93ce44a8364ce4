//! Background activities of the running service.
//!
//! The poller wakes on a fixed interval and starts each tick on its own
//! thread without waiting for the previous one. The update loop long-polls the
//! bot API and hands every command to a fresh thread. Both share the state
//! store; neither holds its lock across network calls.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::domain::Command;
use crate::errors::{RelayError, RelayResult};
use crate::services::{CommandService, IngestService, NotificationService};

/// Server side wait of one `getUpdates` long poll.
const LONG_POLL: Duration = Duration::from_secs(120);
/// Pause after a failed `getUpdates` before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Log an error raised in a background thread.
///
/// Errors that leave the durable state unusable stop the process: running on
/// would acknowledge work that can no longer be persisted.
pub fn escalate(context: &str, err: RelayError) {
    if err.is_fatal() {
        error!(error = %err, "{}: durable state unusable, shutting down", context);
        std::process::exit(2);
    }
    error!(error = %err, "{}", context);
}

pub fn spawn_poller(ingest: Arc<IngestService>, interval: Duration) -> RelayResult<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("poller".to_string())
        .spawn(move || loop {
            thread::sleep(interval);

            let ingest = Arc::clone(&ingest);
            let spawned = thread::Builder::new()
                .name("tick".to_string())
                .spawn(move || {
                    if let Err(e) = ingest.tick() {
                        escalate("Tick failed", e);
                    }
                });
            if let Err(e) = spawned {
                warn!(error = %e, "Could not start tick, skipping it");
            }
        })?;

    Ok(handle)
}

/// Extract the sender chat and command from an update, if it carries one.
pub fn command_from_update(update: &telegram::Update) -> Option<(i64, Command)> {
    let message = update.message.as_ref()?;
    let text = message.text.as_deref()?;
    Command::parse(text).map(|command| (message.chat.id, command))
}

/// Run one command on its own thread.
///
/// A thread that cannot be started drops the command; the update loop keeps going.
pub fn dispatch(commands: Arc<CommandService>, chat_id: i64, command: Command) -> Option<JoinHandle<()>> {
    let name = command.name();
    let spawned = thread::Builder::new()
        .name("command".to_string())
        .spawn(move || {
            if let Err(e) = commands.handle(chat_id, &command) {
                escalate("Command failed", e);
            }
        });

    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(chat_id, command = name, error = %e, "Could not start command, dropping it");
            None
        }
    }
}

/// Serve inbound commands forever.
pub fn run_updates(bot: Arc<NotificationService>, commands: Arc<CommandService>) -> ! {
    let mut offset = 0;
    info!("Listening for commands");

    loop {
        let updates = match bot.updates(offset, LONG_POLL) {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "Could not get updates");
                thread::sleep(RETRY_DELAY);
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some((chat_id, command)) = command_from_update(&update) else {
                debug!(update_id = update.update_id, "Ignoring update without a command");
                continue;
            };
            info!(chat_id, command = command.name(), "Command received");

            dispatch(Arc::clone(&commands), chat_id, command);
        }
    }
}
