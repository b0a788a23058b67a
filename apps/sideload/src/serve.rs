//! JSON-lines host loop
//!
//! Stands in for the UI host: each stdin line is a method call, a lifecycle
//! signal or a completion notification. Calls are answered on stdout, one
//! line per call, in the order their outcomes arrive.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sideload_errors::BackendError;
use sideload_events::{EventEmitter, EventSender};
use sideload_session::{InstallerBackend, InstallerHost, MethodCall, Reply, UserActionLauncher};
use sideload_types::{BridgeResponse, CompletionEvent, CorrelationToken, UserActionDescriptor};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::CliError;

/// One line of input
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HostMessage {
    Call {
        call: MethodCall,
        #[serde(default)]
        id: Option<Value>,
    },
    Lifecycle {
        lifecycle: Lifecycle,
    },
    Notification {
        notification: CompletionEvent,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Foreground,
    Background,
}

/// Answer to one call
#[derive(Debug, Serialize)]
pub struct CallReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub response: BridgeResponse,
}

#[derive(Serialize)]
struct UserActionPrompt<'a> {
    token: CorrelationToken,
    user_action: &'a UserActionDescriptor,
}

/// Asks the driving process to show the confirmation UI by printing the
/// descriptor as its own output line
pub struct StdoutLauncher;

impl UserActionLauncher for StdoutLauncher {
    fn launch(
        &self,
        token: CorrelationToken,
        descriptor: &UserActionDescriptor,
    ) -> Result<(), BackendError> {
        write_line(&UserActionPrompt {
            token,
            user_action: descriptor,
        })
        .map_err(|e| BackendError::LaunchFailed {
            message: e.to_string(),
        })
    }
}

fn write_line<T: Serialize>(value: &T) -> Result<(), CliError> {
    let line = serde_json::to_string(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}

/// Run the loop until stdin closes
///
/// Calls still waiting on the installer when input ends are abandoned.
pub async fn run<B: InstallerBackend + 'static>(
    host: InstallerHost<B>,
    events: EventSender,
) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut waiting: JoinSet<CallReply> = JoinSet::new();

    host.on_foreground();
    events.emit_operation_started("serve");

    loop {
        select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<HostMessage>(&line) {
                    Ok(message) => handle_message(&host, message, &mut waiting)?,
                    Err(e) => {
                        warn!(error = %e, "ignoring malformed input line");
                        events.emit_warning(format!("malformed input line: {e}"));
                    }
                }
            }

            Some(joined) = waiting.join_next(), if !waiting.is_empty() => {
                match joined {
                    Ok(reply) => write_line(&reply)?,
                    Err(e) => warn!(error = %e, "call task failed"),
                }
            }
        }
    }

    if !waiting.is_empty() {
        warn!(
            outstanding = waiting.len(),
            pending = ?host.coordinator().pending_token(),
            "input closed with calls still waiting on the installer"
        );
    }
    waiting.abort_all();
    events.emit_operation_completed("serve", true);
    Ok(())
}

fn handle_message<B: InstallerBackend + 'static>(
    host: &InstallerHost<B>,
    message: HostMessage,
    waiting: &mut JoinSet<CallReply>,
) -> Result<(), CliError> {
    match message {
        HostMessage::Call { call, id } => match host.bridge().dispatch(&call) {
            Reply::Ready(response) => write_line(&CallReply { id, response })?,
            pending @ Reply::Pending(_) => {
                waiting.spawn(async move {
                    let response = pending.into_response().await;
                    CallReply { id, response }
                });
            }
        },
        HostMessage::Lifecycle { lifecycle } => {
            let changed = match lifecycle {
                Lifecycle::Foreground => host.on_foreground(),
                Lifecycle::Background => host.on_background(),
            };
            debug!(?lifecycle, changed, "lifecycle signal");
        }
        HostMessage::Notification { notification } => {
            host.deliver(notification);
        }
    }
    Ok(())
}
