use std::sync::{mpsc, Arc};

use anyhow::{anyhow, Result};
use tokio::runtime::{Builder, Runtime};

use crate::{
    cli::{Cli, Command},
    domain::{self, conversation::Conversation, ids::UserId},
    infra::{self, error::AppError, http_store::HttpMessageStore, logging},
    sync::{self, websocket::WebSocketConnector},
    ui::{self, CrosstermEventSource},
    usecases::{
        self,
        bootstrap::{self, session_identity},
        context::AppContext,
        list_conversations::{list_conversations, ListConversationsError},
        message_store::MessageStore,
        shell::{DefaultShellOrchestrator, ShellSettings},
        store_dispatcher::TokioStoreDispatcher,
    },
};

const APP_CONVERSATIONS_FAILED: &str = "APP_CONVERSATIONS_FAILED";

pub fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(cli.config.as_deref())?;

    match cli.command_or_default() {
        Command::Run => {
            let _guard = logging::init_file(&context.config.logging, &context.layout.log_dir)?;
            log_module_boundaries();
            run_shell(&context)
        }
        Command::Conversations => {
            logging::init_stderr(&context.config.logging)?;
            log_module_boundaries();
            print_conversations(&context)
        }
    }
}

fn log_module_boundaries() {
    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        sync = sync::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );
}

fn build_runtime() -> Result<Runtime, AppError> {
    Builder::new_multi_thread()
        .enable_all()
        .thread_name("mktchat-io")
        .build()
        .map_err(AppError::RuntimeInit)
}

fn build_store(context: &AppContext) -> Result<Arc<dyn MessageStore>, AppError> {
    let store = HttpMessageStore::new(&context.config.server, context.config.session.token.trim())?;
    Ok(Arc::new(store))
}

fn run_shell(context: &AppContext) -> Result<()> {
    let local_user = session_identity(&context.config.session)?;
    let runtime = build_runtime()?;
    let (events_tx, events_rx) = mpsc::channel();

    let dispatcher = TokioStoreDispatcher::new(
        runtime.handle().clone(),
        build_store(context)?,
        events_tx.clone(),
    );
    let connector = WebSocketConnector::new(
        runtime.handle().clone(),
        context.config.server.events_url.clone(),
        context.config.session.token.trim(),
        Arc::new(events_tx),
    );

    let mut orchestrator =
        DefaultShellOrchestrator::new(shell_settings(context, local_user), connector, dispatcher);
    let mut event_source = CrosstermEventSource::new(events_rx);

    let result = ui::shell::start(context, &mut event_source, &mut orchestrator);
    drop(orchestrator);
    runtime.shutdown_background();
    result
}

fn shell_settings(context: &AppContext, local_user: UserId) -> ShellSettings {
    ShellSettings {
        local_user,
        typing_quiet_window: context.config.chat.typing_quiet_window(),
        typing_emit_interval: context.config.chat.typing_emit_interval(),
        max_message_chars: context.config.chat.max_message_chars,
    }
}

fn print_conversations(context: &AppContext) -> Result<()> {
    session_identity(&context.config.session)?;
    let runtime = build_runtime()?;
    let store = build_store(context)?;

    let conversations = runtime
        .block_on(list_conversations(store.as_ref()))
        .map_err(|error| {
            tracing::error!(code = APP_CONVERSATIONS_FAILED, ?error, "listing conversations failed");
            anyhow!(conversations_error_message(&error))
        })?;

    if conversations.is_empty() {
        println!("No conversations yet.");
    }
    for conversation in &conversations {
        println!("{}", conversation_summary_line(conversation));
    }

    Ok(())
}

fn conversations_error_message(error: &ListConversationsError) -> &'static str {
    match error {
        ListConversationsError::Unauthorized => {
            "The message store rejected the session token. Update [session] in the config."
        }
        ListConversationsError::TemporarilyUnavailable => {
            "The message store is unreachable right now. Try again later."
        }
        ListConversationsError::DataContractViolation => {
            "The message store answered with data this client does not understand."
        }
    }
}

fn conversation_summary_line(conversation: &Conversation) -> String {
    let preview = conversation
        .last_message
        .as_ref()
        .map(|last| last.content.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let unread = match conversation.unread_count {
        0 => "    ".to_owned(),
        count => format!("[{count}]"),
    };

    format!("{unread:>4} {}: {preview}", conversation.title())
        .trim_end()
        .to_owned()
}
