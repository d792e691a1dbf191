use clap::{Parser, Subcommand};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "reelsyncctl", version)]
#[command(about = "Inspect and refresh the local Jellyfin/Emby catalog cache")]
pub struct Cli {
    /// Print results as JSON instead of tab-separated text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with a username and password and remember the session
    Login {
        /// Server address, e.g. media.local:8096
        #[arg(long, env = "REELSYNC_SERVER_URL")]
        server: String,
        #[arg(long, short)]
        username: String,
        #[arg(long, short, env = "REELSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the saved session and drop the local cache
    Logout,
    /// Show the current session and storage locations
    Status,
    /// Print a cached list, e.g. `AllUserViews` or `ChildrenOf:<id>`
    List {
        cache_key: String,
        /// Fetch from the server before printing
        #[arg(long)]
        refresh: bool,
    },
    /// Print one cached item and its media sources
    Item {
        id: String,
        /// Fetch full details from the server before printing
        #[arg(long)]
        refresh: bool,
    },
    /// Print the stream choices of an item's primary source
    Streams { id: String },
    /// Make one of the item's sources primary
    SelectSource { item: String, source: String },
    /// Print a list every time it changes until interrupted
    Watch {
        cache_key: String,
        /// Refresh from the server once after subscribing
        #[arg(long)]
        refresh: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn select_source_takes_two_positionals() {
        let cli =
            Cli::try_parse_from(["reelsyncctl", "select-source", "m1", "s2"])
                .expect("parses");

        match cli.command {
            Command::SelectSource { item, source } => {
                assert_eq!(item, "m1");
                assert_eq!(source, "s2");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
