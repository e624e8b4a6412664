mod api;
mod clipboard;
mod commands;
mod prefs;
mod prompts;
mod render;
mod session;

use std::io::Write as _;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde_json::Value;
use time::UtcOffset;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::api::{ApiError, ChatApi, HttpChatApi};
use crate::clipboard::ClipboardManager;
use crate::commands::Command as Input;
use crate::prefs::Prefs;
use crate::render::{Renderer, Theme};
use crate::session::{CLEAR_CONFIRMATION, ChatSession, ClearOutcome, Role, SendOutcome};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("could not start a conversation")]
    NoConversation,
    #[error("the server failed to reply")]
    SendFailed,
    #[error("nothing to send; pass a message or a suggestion number from 1 to 4")]
    NothingSent,
}

#[derive(Parser, Debug)]
#[command(name = "chat", about = "Terminal client for the chatbot server")]
struct Cli {
    #[arg(long, env = "CHATBOT_BASE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// Use dark mode for this run.
    #[arg(long)]
    dark: bool,

    /// Model label shown in the header.
    #[arg(long, env = "CHATBOT_POWERED_BY", default_value = "Gemini 2.5")]
    powered_by: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat (default).
    Chat,
    /// Check that the server is up.
    Ping,
    /// Send one message and print the reply.
    Send {
        #[arg(required_unless_present = "suggestion")]
        message: Option<String>,
        /// Send suggested prompt N (1-4) instead of a message.
        #[arg(long, conflicts_with = "message")]
        suggestion: Option<usize>,
        /// Continue an existing conversation instead of starting one.
        #[arg(long)]
        conversation_id: Option<i64>,
    },
    /// Print the stored messages of a conversation as JSON.
    History { conversation_id: i64 },
}

type InputLines = Lines<BufReader<Stdin>>;

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // The local offset can only be read soundly while single-threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run(cli, offset))
}

async fn run(mut cli: Cli, offset: UtcOffset) -> Result<(), CliError> {
    let api = HttpChatApi::new(&cli.base_url);
    match cli.command.take() {
        None | Some(Command::Chat) => run_chat(api, &cli, offset).await,
        Some(Command::Ping) => print_json(&api.health().await?),
        Some(Command::Send { message, suggestion, conversation_id }) => {
            run_send(api, message, suggestion, conversation_id).await
        }
        Some(Command::History { conversation_id }) => {
            print_json(&Value::Array(api.list_messages(conversation_id).await?))
        }
    }
}

async fn run_send(
    api: HttpChatApi,
    message: Option<String>,
    suggestion: Option<usize>,
    conversation_id: Option<i64>,
) -> Result<(), CliError> {
    let mut session = match conversation_id {
        Some(id) => ChatSession::resume(api, id),
        None => {
            let mut session = ChatSession::new(api);
            if !session.initialize().await {
                return Err(CliError::NoConversation);
            }
            session
        }
    };

    let outcome = match (suggestion, message) {
        (Some(number), _) => session.send_suggested(number).await,
        (None, Some(message)) => session.send(&message).await,
        (None, None) => SendOutcome::Ignored,
    };
    let reply = session.messages().last().filter(|m| m.role == Role::Assistant);
    match (outcome, reply) {
        (SendOutcome::Replied, Some(reply)) => {
            if let (Some(conversation_id), Some(message_id)) = (session.conversation_id(), reply.id) {
                eprintln!("conversation: {conversation_id} message: {message_id}");
            }
            println!("{}", reply.content);
            Ok(())
        }
        (SendOutcome::Failed, _) => Err(CliError::SendFailed),
        _ => Err(CliError::NothingSent),
    }
}

// =============================================================================
// INTERACTIVE
// =============================================================================

struct Repl {
    session: ChatSession<HttpChatApi>,
    renderer: Renderer,
    clipboard: ClipboardManager,
    prefs: Prefs,
    prefs_path: std::path::PathBuf,
    base_url: String,
}

async fn run_chat(api: HttpChatApi, cli: &Cli, offset: UtcOffset) -> Result<(), CliError> {
    let prefs_path = prefs::prefs_path();
    let prefs = Prefs::load(&prefs_path);
    let theme = Theme::from_dark(cli.dark || prefs.dark_mode);

    let mut repl = Repl {
        session: ChatSession::new(api),
        renderer: Renderer::new(theme, offset, &cli.powered_by),
        clipboard: ClipboardManager::new(),
        prefs,
        prefs_path,
        base_url: cli.base_url.clone(),
    };

    print!("{}", repl.renderer.header());
    repl.start_conversation().await;
    print!("{}", repl.renderer.transcript(&[], None));
    print!("{}", repl.renderer.footer());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", repl.renderer.prompt());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if !repl.handle(commands::parse(&line), &mut lines).await? {
            break;
        }
    }
    Ok(())
}

impl Repl {
    async fn start_conversation(&mut self) {
        if !self.session.initialize().await {
            print!(
                "{}",
                self.renderer.notice(&format!(
                    "Could not start a conversation at {}. Input is disabled until the server is reachable.",
                    self.base_url
                ))
            );
        }
    }

    /// Handle one line of input. Returns `false` to exit.
    async fn handle(&mut self, input: Input, lines: &mut InputLines) -> Result<bool, CliError> {
        match input {
            Input::Quit => return Ok(false),
            Input::Help => print!("{}", self.renderer.help()),
            Input::Prompts => print!("{}", self.renderer.empty_state()),
            Input::Message(text) => self.send(&text).await,
            Input::Suggested(number) => match prompts::by_number(number) {
                Some(prompt) => self.send(prompt.text).await,
                None => print!("{}", self.renderer.notice("No such suggestion; try /1 to /4.")),
            },
            Input::Clear => self.clear(lines).await?,
            Input::ToggleDark => self.toggle_dark(),
            Input::Copy(number) => self.copy(number),
            Input::Unknown(raw) => print!("{}", self.renderer.notice(&format!("Unknown command {raw}; /help lists commands."))),
        }
        Ok(true)
    }

    async fn send(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if !self.session.ensure_conversation().await {
            print!("{}", self.renderer.notice(&format!("Still cannot reach {}; message not sent.", self.base_url)));
            return;
        }

        let Some(pending) = self.session.begin_send(text) else {
            return;
        };
        self.print_last();
        if self.session.is_loading() {
            print!("{}", self.renderer.thinking());
            let _ = std::io::stdout().flush();
        }

        let result = self.session.api().send_message(pending.conversation_id, &pending.message).await;
        self.session.finish_send(result);
        self.print_last();
    }

    fn print_last(&self) {
        let messages = self.session.messages();
        if let Some(last) = messages.last() {
            print!("{}", self.renderer.message(messages.len(), last, false));
        }
    }

    async fn clear(&mut self, lines: &mut InputLines) -> Result<(), CliError> {
        if self.session.conversation_id().is_none() {
            print!("{}", self.renderer.notice("No conversation to clear."));
            return Ok(());
        }

        print!("{CLEAR_CONFIRMATION} [y/N] ");
        std::io::stdout().flush()?;
        let answer = lines.next_line().await?.unwrap_or_default();
        let confirmed = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");

        match self.session.clear(confirmed).await {
            ClearOutcome::Cleared => {
                print!("{}", self.renderer.header());
                print!("{}", self.renderer.transcript(self.session.messages(), None));
            }
            ClearOutcome::Failed => print!("{}", self.renderer.notice("Failed to clear the conversation.")),
            ClearOutcome::Declined | ClearOutcome::NoConversation => {}
        }
        Ok(())
    }

    fn toggle_dark(&mut self) {
        self.renderer.theme = self.renderer.theme.toggled();
        self.prefs.dark_mode = self.renderer.theme.is_dark();
        if let Err(e) = self.prefs.save(&self.prefs_path) {
            warn!(error = %e, "failed to save preferences");
        }

        let copied = self.session.copied_index(Instant::now());
        print!("{}", self.renderer.header());
        print!("{}", self.renderer.transcript(self.session.messages(), copied));
    }

    fn copy(&mut self, number: Option<usize>) {
        let Some(index) = self.session.copy_target(number) else {
            print!("{}", self.renderer.notice("Nothing to copy."));
            return;
        };
        if self.clipboard.copy(&self.session.messages()[index].content) {
            self.session.mark_copied(index, Instant::now());
            print!("{}", self.renderer.copied_notice(index + 1));
        } else {
            print!("{}", self.renderer.notice("Clipboard unavailable."));
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
