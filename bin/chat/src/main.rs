//! Terminal chat over a remote assistant.
//!
//! Configuration comes from `DIALOGUE_*` environment variables (see
//! [`DialogueConfig`]); logs go to stderr and are filtered with `RUST_LOG`.

mod command;

use command::{Command, HELP, parse};
use smart_dialogue::{Dialogue, DialogueConfig, DialogueError, SendOptions};
use smart_dialogue_assistants::AssistantsClient;
use smart_dialogue_conversation::TurnRole;
use smart_dialogue_core::ConversationId;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match DialogueConfig::from_env() {
        Ok(config) => config,
        Err(report) => {
            tracing::error!(error = %report, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    let dialogue = match Dialogue::from_config(&config) {
        Ok(dialogue) => dialogue,
        Err(report) => {
            tracing::error!(error = %report, "failed to set up dialogue");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        assistant_id = %config.assistant_id,
        window = ?config.window,
        max_tokens = config.budget.max_tokens,
        "loaded configuration"
    );

    let mut conversation = ConversationId::new();
    let mut assistant: Option<String> = None;
    println!("conversation {conversation} (type /help for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => break,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read input");
                return ExitCode::FAILURE;
            }
        };

        match parse(&line) {
            Command::Blank => {}
            Command::Say(text) => {
                let mut options = SendOptions::new();
                if let Some(id) = &assistant {
                    options = options.with_assistant_id(id);
                }
                say(&dialogue, conversation, text, options).await;
            }
            Command::Reset => {
                dialogue.delete_conversation(conversation);
                conversation = ConversationId::new();
                println!("conversation {conversation}");
            }
            Command::ResetAll => {
                dialogue.delete_all_conversations();
                conversation = ConversationId::new();
                println!("all conversations cleared; conversation {conversation}");
            }
            Command::History => {
                for turn in dialogue.history(conversation) {
                    let speaker = match turn.role() {
                        TurnRole::User => "you",
                        TurnRole::Assistant => "assistant",
                    };
                    println!(
                        "[{}] {speaker}: {}",
                        turn.created_at().format("%H:%M:%S"),
                        turn.text()
                    );
                }
            }
            Command::Assistants => match dialogue.list_assistants().await {
                Ok(assistants) => {
                    for listed in assistants {
                        println!(
                            "{}  {}  ({})",
                            listed.id,
                            listed.name.as_deref().unwrap_or("-"),
                            listed.model
                        );
                    }
                }
                Err(report) => tracing::warn!(error = %report, "failed to list assistants"),
            },
            Command::Use(id) => {
                println!("sending to {id}");
                assistant = Some(id);
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Unknown(input) => println!("unknown command: {input}"),
        }
    }

    ExitCode::SUCCESS
}

/// Runs one exchange, cancelling it if Ctrl-C arrives while it is in flight.
async fn say(
    dialogue: &Dialogue<AssistantsClient>,
    conversation: ConversationId,
    text: String,
    options: SendOptions,
) {
    let cancel = CancellationToken::new();
    let send =
        dialogue.send_message_with(conversation, text, options.with_cancellation(cancel.clone()));
    tokio::pin!(send);

    let result = tokio::select! {
        result = &mut send => result,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            send.await
        }
    };

    match result {
        Ok(reply) => println!("assistant: {reply}"),
        Err(report) => match report.current_context() {
            DialogueError::Cancelled { .. } => println!("(cancelled)"),
            DialogueError::EmptyReply { .. } => println!("(no reply)"),
            _ => tracing::warn!(error = %report, "exchange failed"),
        },
    }
}
