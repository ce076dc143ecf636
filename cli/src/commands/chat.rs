use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use prospector_core::ProspectingSession;
use prospector_core::ProspectorApi;
use prospector_core::SearchState;
use prospector_core::SendOutcome;
use prospector_core::chat::Sender;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use crate::context::CliContext;
use crate::render::format_filter;
use crate::render::format_results;

/// Extra wait after the debounce window so the driver has issued its search.
const SETTLE_MARGIN: Duration = Duration::from_millis(100);

const HELP: &str = "Commands: /filters, /results, /quit. Anything else is sent to the assistant.";

#[derive(Debug, clap::Parser)]
pub struct ChatArgs {
    /// Send these messages in order, print the final results and exit.
    /// Without it, prompts are read from stdin one line at a time.
    #[arg(long = "message", short = 'm', value_name = "TEXT")]
    pub messages: Vec<String>,
}

pub(crate) async fn run_chat(context: &CliContext, args: ChatArgs) -> Result<()> {
    context.require_session()?;
    let api: Arc<dyn ProspectorApi> = Arc::new(context.client.clone());
    let session = ProspectingSession::start(api, &context.config);
    if let Some(greeting) = session.chat().conversation().last() {
        println!("assistant> {}", greeting.text);
    }

    let outcome = if args.messages.is_empty() {
        repl(context, &session).await
    } else {
        for message in &args.messages {
            exchange(&session, message).await;
        }
        let state = settled_state(&session, context).await;
        println!("{}", format_search_state(&state));
        Ok(())
    };

    session.shutdown().await;
    outcome
}

async fn repl(context: &CliContext, session: &ProspectingSession) -> Result<()> {
    eprintln!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/filters" => println!("{}", format_filter(&session.filters().canonical())),
            "/results" => {
                let state = settled_state(session, context).await;
                println!("{}", format_search_state(&state));
            }
            prompt => exchange(session, prompt).await,
        }
    }
    Ok(())
}

/// Sends one prompt and prints whatever the assistant appended.
async fn exchange(session: &ProspectingSession, prompt: &str) {
    let chat = session.chat();
    let before = chat.conversation().messages().len();
    match chat.send(prompt).await {
        SendOutcome::Blank => {}
        SendOutcome::Busy => eprintln!("Still waiting for the previous reply."),
        SendOutcome::Sent | SendOutcome::Failed => {
            let conversation = chat.conversation();
            for message in conversation.messages().iter().skip(before) {
                if message.sender == Sender::Bot {
                    println!("assistant> {}", message.text);
                }
            }
        }
    }
}

/// The result set once pending filter edits have been searched.
async fn settled_state(session: &ProspectingSession, context: &CliContext) -> SearchState {
    tokio::time::sleep(context.config.debounce() + SETTLE_MARGIN).await;
    let mut state = session.search().subscribe();
    let settled = tokio::time::timeout(
        context.config.request_timeout(),
        state.wait_for(|state| !state.loading),
    )
    .await;
    match settled {
        Ok(Ok(current)) => current.clone(),
        _ => session.search().current(),
    }
}

fn format_search_state(state: &SearchState) -> String {
    match &state.error {
        Some(error) => format!("Search failed: {error}"),
        None => format_results(&state.results),
    }
}
