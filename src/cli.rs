use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::ConfigOverrides;

#[derive(Parser)]
#[command(name = "racecard")]
#[command(about = "Race cards, horse histories and jockey stats from exported JSON", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct GlobalArgs {
    /// Config file (default: racecard.json, or $RACECARD_CONFIG)
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,
    /// Base URL serving /server/*.json
    #[arg(long, global = true)]
    pub(crate) data_url: Option<String>,
    /// Local directory holding RaceTest.json etc. (directly or under server/)
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Refresh endpoint of the job runner
    #[arg(long, global = true)]
    pub(crate) update_url: Option<String>,
    /// Print JSON instead of a table
    #[arg(long, global = true)]
    pub(crate) json: bool,
}

impl GlobalArgs {
    pub(crate) fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            data_url: self.data_url.clone(),
            data_dir: self.data_dir.clone(),
            update_url: self.update_url.clone(),
            bind: None,
            port: None,
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List every race in the current document.
    List,

    /// Show one race card.
    Race {
        venue: String,
        race_number: String,
        /// Hide a column (repeatable): waku, num, mark, name, serei, weight, jockey, trainer, bataiju, odds
        #[arg(long = "hide")]
        hide: Vec<String>,
        /// Show a column hidden by default (repeatable)
        #[arg(long = "show")]
        show: Vec<String>,
        /// Flip a column's visibility, applied after --show/--hide (repeatable)
        #[arg(long = "toggle")]
        toggle: Vec<String>,
        /// Put a yosou mark on a horse: <num>=<mark>, mark as symbol or name (repeatable)
        #[arg(long = "mark")]
        marks: Vec<String>,
    },

    /// Show a horse profile and its past races.
    Horse { name: String },

    /// Show a jockey profile and stats.
    Jockey { name: String },

    /// Render a route such as /race/%E4%B8%AD%E5%B1%B1/11?hide=odds
    Open { route: String },

    /// Ask the job runner to refresh the race data.
    Update {
        /// Day key to target (saturday, sunday, monday)
        #[arg(long)]
        target: Option<String>,
        /// Venue keyword for a single-venue fetch
        #[arg(long)]
        venue: Option<String>,
        /// Source URL for the race card page
        #[arg(long)]
        url: Option<String>,
        /// Fetch with a headless browser
        #[arg(long)]
        playwright: bool,
        /// Refuse to run while the source site is mid-update
        #[arg(long)]
        strict: bool,
        /// Fetch only the selected venue instead of all venues
        #[arg(long)]
        single_venue: bool,
        /// Skip fetching horse detail pages
        #[arg(long)]
        skip_horse_detail: bool,
        /// Skip fetching jockey detail pages
        #[arg(long)]
        skip_jockey_detail: bool,
    },

    /// Serve the views as HTML pages.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show recent refresh attempts.
    History {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommand {
    /// Print the resolved configuration.
    Show,
    /// Write a config file with the default settings.
    Init {
        #[arg(long)]
        force: bool,
    },
}
