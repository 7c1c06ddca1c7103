use std::{
    future::Future,
    io::{self, IsTerminal},
    sync::Arc,
};

use anyhow::Result;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Runtime,
};

use crate::{
    cli::{Cli, Command},
    domain::{self, status::SessionStatus},
    infra::{self, error::AppError, secrets::redact_text},
    twitch,
    ui::{self, console::ConsoleSink},
    usecases::{self, bootstrap, context::AppContext},
};

const CHAT_SESSION_STARTED: &str = "CHAT_SESSION_STARTED";
const CHAT_SESSION_ENDED: &str = "CHAT_SESSION_ENDED";
const CHAT_STDIN_FAILED: &str = "CHAT_STDIN_FAILED";

const QUIT_COMMAND: &str = "/quit";

pub fn run(cli: Cli) -> Result<()> {
    let Command::Run(args) = cli.command_or_default();
    let context = bootstrap::bootstrap(cli.config.as_deref(), args.overrides())?;

    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        twitch = twitch::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;

    if let Err(error) = run_detached(runtime, chat_loop(&context)) {
        eprintln!("{}", redact_text(&format!("rtchat: {error:#}")));
        return Err(error);
    }

    Ok(())
}

/// Runs `future` to completion, then shuts the runtime down without waiting
/// for blocking-pool work. A pending stdin read never finishes on its own.
fn run_detached<F: Future>(runtime: Runtime, future: F) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    output
}

/// Streams chat to stdout and sends stdin lines until the user quits or
/// the session ends on its own.
async fn chat_loop(context: &AppContext) -> Result<()> {
    let sink = Arc::new(ConsoleSink::stdout(io::stdout().is_terminal()));
    let mut manager = bootstrap::compose_session(context, sink.clone());

    let session_id = manager.connect(context.identity(), context.channel()).await?;
    tracing::info!(
        code = CHAT_SESSION_STARTED,
        session_id = %session_id,
        "chat session started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = manager.wait_for_status(SessionStatus::Disconnected) => break,
            line = lines.next_line() => match line {
                Ok(Some(text)) if text.trim() == QUIT_COMMAND => break,
                Ok(Some(text)) => manager.say(&text),
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!(code = CHAT_STDIN_FAILED, error = %error, "stdin closed");
                    break;
                }
            },
        }
    }

    manager.disconnect().await;
    tracing::info!(
        code = CHAT_SESSION_ENDED,
        chatters = sink.chatter_count(),
        "chat session ended"
    );
    Ok(())
}
