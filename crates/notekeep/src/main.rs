//! `notekeep` - CLI for the note archive and ingest endpoint

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;

use notekeep::archive::{
    ArchiveClient, Confirm, DeleteOutcome, FsObjectStore, Listing, DELETE_PROMPT,
};
use notekeep::cli::{
    Cli, Command, ConfigCommand, DeleteCommand, DownloadCommand, ListCommand, PromptConfirm,
    Reporter, SaveCommand, ServeCommand,
};
use notekeep::{ingest, init_logging, Config};

type Client = ArchiveClient<FsObjectStore>;
type Out = Reporter<io::Stdout>;

/// An answer collected before the delete runs.
struct Answered(bool);

impl Confirm for Answered {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());
    let mut out = Reporter::stdout(cli.quiet);

    // `config validate` reports load errors itself
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        return validate_config(&mut out, file.clone().or_else(|| cli.config.clone()));
    }

    let config = Config::load_from(cli.config.clone()).context("Failed to load configuration")?;

    match cli.command {
        Command::Save(cmd) => handle_save(&open_client(&config)?, &mut out, cmd).await,
        Command::List(cmd) => handle_list(&open_client(&config)?, &mut out, &cmd).await,
        Command::Download(cmd) => handle_download(&open_client(&config)?, &mut out, &cmd).await,
        Command::Delete(cmd) => handle_delete(&open_client(&config)?, &mut out, &cmd).await,
        Command::Serve(cmd) => handle_serve(&config, cmd).await,
        Command::Config(cmd) => handle_config(&config, &mut out, cmd),
    }
}

fn open_client(config: &Config) -> anyhow::Result<Client> {
    let path = config.container_path();
    let store = FsObjectStore::open(&path)
        .with_context(|| format!("Failed to open note container {}", path.display()))?;
    Ok(ArchiveClient::new(store))
}

async fn handle_save(client: &Client, out: &mut Out, cmd: SaveCommand) -> anyhow::Result<()> {
    let content = match (cmd.content, cmd.file) {
        (Some(content), _) => content,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read note content from stdin")?;
            buf
        }
    };

    let outcome = client
        .save_note(&cmd.title, &content)
        .await
        .context("Failed to save note")?;

    out.status(format_args!("Note saved: {}", outcome.note.name))?;
    show_refreshed(out, &outcome.listing)
}

async fn handle_list(client: &Client, out: &mut Out, cmd: &ListCommand) -> anyhow::Result<()> {
    let listing = client.list_notes().await.context("Failed to list notes")?;

    if cmd.json {
        let json = serde_json::to_string_pretty(listing.notes())?;
        out.data(format!("{json}\n").as_bytes())?;
    } else {
        out.listing(&listing)?;
    }
    Ok(())
}

async fn handle_download(
    client: &Client,
    out: &mut Out,
    cmd: &DownloadCommand,
) -> anyhow::Result<()> {
    if cmd.stdout {
        let bytes = client
            .download_note(&cmd.name)
            .await
            .context("Failed to download note")?;
        out.data(&bytes)?;
        return Ok(());
    }

    let path = client
        .download_to(&cmd.name, &cmd.output)
        .await
        .context("Failed to download note")?;
    out.status(format_args!("Note downloaded: {}", path.display()))?;
    Ok(())
}

async fn handle_delete(client: &Client, out: &mut Out, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let confirmed = if cmd.yes {
        true
    } else {
        tokio::task::spawn_blocking(|| {
            PromptConfirm::new(io::stdin().lock(), io::stdout()).confirm(DELETE_PROMPT)
        })
        .await
        .context("Failed to read confirmation")?
    };

    match client
        .delete_note(&cmd.name, &Answered(confirmed))
        .await
        .context("Failed to delete note")?
    {
        DeleteOutcome::Cancelled => out.status("Delete cancelled.")?,
        DeleteOutcome::Deleted(listing) => {
            out.status(format_args!("Note deleted: {}", cmd.name))?;
            show_refreshed(out, &listing)?;
        }
    }
    Ok(())
}

/// Show the listing fetched after a write; a failed refresh is not fatal.
fn show_refreshed(out: &mut Out, listing: &notekeep::Result<Listing>) -> anyhow::Result<()> {
    match listing {
        Ok(listing) => out.refreshed(listing)?,
        Err(err) => eprintln!("Warning: could not refresh the note list: {err}"),
    }
    Ok(())
}

async fn handle_serve(config: &Config, cmd: ServeCommand) -> anyhow::Result<()> {
    let bind = cmd.bind.unwrap_or_else(|| config.ingest.bind_address.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {bind}"))?;

    let store =
        ingest::open_document_store(config).context("Failed to open document store")?;
    ingest::serve(addr, store)
        .await
        .context("Ingest endpoint failed")?;
    Ok(())
}

fn handle_config(config: &Config, out: &mut Out, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = config.redacted();
            let text = if json {
                format!("{}\n", serde_json::to_string_pretty(&config)?)
            } else {
                format!(
                    "Current Configuration\n\
                     =====================\n\
                     \n\
                     [Archive]\n  \
                     Container path:  {}\n\
                     \n\
                     [Ingest]\n  \
                     Bind address:    {}\n  \
                     Store endpoint:  {}\n  \
                     Store key:       {}\n",
                    config.container_path().display(),
                    config.ingest.bind_address,
                    config.ingest.store_endpoint.as_deref().unwrap_or("(local)"),
                    config.ingest.store_key.as_deref().unwrap_or("(none)"),
                )
            };
            out.data(text.as_bytes())?;
        }
        ConfigCommand::Path => {
            out.data(format!("{}\n", Config::default_config_path().display()).as_bytes())?;
        }
        ConfigCommand::Validate { file } => {
            return validate_config(out, file);
        }
    }
    Ok(())
}

fn validate_config(out: &mut Out, file: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    out.status(format_args!("Validating configuration: {}", path.display()))?;
    Config::load_from(Some(path)).context("Configuration error")?;
    out.status("Configuration is valid.")?;
    Ok(())
}
