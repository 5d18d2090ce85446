use std::{path::PathBuf, sync::Arc};

use clap::{
    Parser,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};

use artist_graph::{Res, cli, config, error, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Name of the playlist to graph; lists your playlists when omitted
    playlist: Option<String>,

    /// Open the authorization URL in the default browser
    #[clap(long)]
    open: bool,

    /// Token file location (defaults to <config dir>/artist_graph/tokens.toml)
    #[clap(long)]
    token_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let args = Cli::parse();

    if let Err(e) = run(args).await {
        error!("{}", e);
    }
}

async fn run(args: Cli) -> Res<()> {
    let config = Arc::new(config::Config::from_env()?.with_token_path(args.token_file));
    let client = cli::get_client(config, args.open).await?;

    let mut stdout = std::io::stdout().lock();
    cli::run(&client, args.playlist.as_deref(), &mut stdout).await
}
