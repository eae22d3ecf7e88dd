mod app;
mod commands;
mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "deckshare-cli", about = "Import, export and subscribe to shared decks", version)]
struct Cli {
    /// Collection directory (default: platform data dir)
    #[arg(long, global = true)]
    collection: Option<PathBuf>,

    /// Subscription registry file (default: platform config dir)
    #[arg(long, global = true)]
    subscriptions: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Import a deck payload into a local deck
    Import {
        /// Deck payload JSON file
        payload: PathBuf,
        /// Local deck name (created if missing); defaults to the subscription's deck
        #[arg(long, required_unless_present = "subscription")]
        deck: Option<String>,
        /// Import settings TOML file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Import as an update of this subscription
        #[arg(long)]
        subscription: Option<String>,
        /// Map changed models by matching field and template names
        #[arg(long, conflicts_with = "interactive")]
        map_by_name: bool,
        /// Ask on stdin how to map each changed model
        #[arg(long)]
        interactive: bool,
    },

    /// Export a local deck as a payload
    Export {
        /// Local deck name
        #[arg(long)]
        deck: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage subscribed decks
    #[command(subcommand)]
    Subs(SubsCommand),
}

#[derive(Subcommand)]
enum SubsCommand {
    /// List subscriptions
    List,
    /// Subscribe to a deck
    Add { key: String },
    /// Unsubscribe from a deck
    Remove { key: String },
    /// Set the local deck a subscription imports into
    SetDeck { key: String, deck: String },
    /// Subscribe to or unsubscribe from an optional tag group
    Tag {
        key: String,
        tag: String,
        state: Toggle,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = app::App::new(cli.collection, cli.subscriptions)?;

    match cli.command {
        Command::Import {
            payload,
            deck,
            config,
            subscription,
            map_by_name,
            interactive,
        } => {
            let mapping = if interactive {
                commands::import::Mapping::Interactive
            } else if map_by_name {
                commands::import::Mapping::ByName
            } else {
                commands::import::Mapping::Cached
            };
            commands::import::run(
                &app,
                &payload,
                deck.as_deref(),
                config.as_deref(),
                subscription.as_deref(),
                mapping,
                &cli.format,
            )?;
        }
        Command::Export { deck, output } => {
            commands::export::run(&app, &deck, output.as_deref())?;
        }
        Command::Subs(subcmd) => match subcmd {
            SubsCommand::List => commands::subs::run_list(&app, &cli.format)?,
            SubsCommand::Add { key } => commands::subs::run_add(&app, &key)?,
            SubsCommand::Remove { key } => commands::subs::run_remove(&app, &key)?,
            SubsCommand::SetDeck { key, deck } => commands::subs::run_set_deck(&app, &key, &deck)?,
            SubsCommand::Tag { key, tag, state } => {
                commands::subs::run_tag(&app, &key, &tag, matches!(state, Toggle::On))?
            }
        },
    }

    Ok(())
}
