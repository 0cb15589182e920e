use std::io::{self, Write};
use std::process::ExitCode;

use chat_provider_copilot::CopilotProvider;
use chatsh::cli::{ChatArgs, Cli, Command};
use chatsh::clipboard::{clipboard_context, SystemClipboard};
use chatsh::config::ChatshConfig;
use chatsh::{ChatSession, ChatTurn, ChatshError, DeviceFlow};
use clap::Parser;

fn main() -> ExitCode {
    chatsh::logging::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ChatshConfig::from_env().map_err(ChatshError::from)?;
    match cli.command {
        Command::Setup => setup(&config)?,
        Command::Chat(args) => chat(&config, &args)?,
    }
    Ok(())
}

fn setup(config: &ChatshConfig) -> Result<(), ChatshError> {
    let store = config.credential_store()?;
    let provider = CopilotProvider::new(config.api_config()).map_err(ChatshError::Provider)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    DeviceFlow::new(&provider, &store).run_handshake(&mut out)?;
    writeln!(out, "Authenticate Success").map_err(|error| ChatshError::Auth(error.into()))?;
    Ok(())
}

fn chat(config: &ChatshConfig, args: &ChatArgs) -> Result<(), ChatshError> {
    let input = args
        .read_query(&mut io::stdin().lock())
        .map_err(ChatshError::Stdin)?;
    let extra_context = if args.clipboard_context {
        Some(clipboard_context(&SystemClipboard::default())?)
    } else {
        None
    };

    let store = config.credential_store()?;
    let provider = CopilotProvider::new(config.api_config()).map_err(ChatshError::Provider)?;
    let session = ChatSession::new(
        store,
        &provider,
        &provider,
        config.chat_settings(args.prompt.as_deref()),
    );

    let reply = session.run_chat(&ChatTurn {
        history_path: args.chat_file.clone(),
        input,
        extra_context,
    })?;
    println!("{reply}");
    Ok(())
}
