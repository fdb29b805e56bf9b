//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use amiibo_shelf_core::{Config, Filter};

#[derive(Parser)]
#[command(name = "amiibo-shelf")]
#[command(about = "Track, export and share an amiibo collection", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    /// View a shared collection (token or full share link). Read-only.
    #[arg(long, global = true, value_name = "TOKEN|URL")]
    pub shared: Option<String>,

    /// Never contact the remote API; use cached data only
    #[arg(long, global = true)]
    pub offline: bool,

    /// Write log output to a file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Narrowing options for `list`.
#[derive(Args, Clone, Default)]
pub(crate) struct FilterArgs {
    /// Match display name or character (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only owned items
    #[arg(long, conflicts_with = "not_owned")]
    pub owned: bool,

    /// Only items not owned
    #[arg(long)]
    pub not_owned: bool,

    /// Only favorites
    #[arg(long)]
    pub favorites: bool,

    /// Game series, exact match
    #[arg(long)]
    pub series: Option<String>,

    /// Item type (Figure, Card, Yarn, Band), exact match
    #[arg(long = "type")]
    pub item_type: Option<String>,
}

impl FilterArgs {
    /// Build the filter. A shared collection only lists what its owner has
    /// unless an ownership flag was given.
    pub fn to_filter(&self, shared: bool) -> Filter {
        let owned = match (self.owned, self.not_owned) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ if shared => Some(true),
            _ => None,
        };
        Filter {
            search: self.search.clone(),
            owned,
            favorites_only: self.favorites,
            game_series: self.series.clone(),
            item_type: self.item_type.clone(),
        }
    }
}

/// Settings changed by `config`.
#[derive(Args, Clone, Default)]
pub(crate) struct ConfigArgs {
    /// Base URL of the amiibo API
    #[arg(long)]
    pub api_url: Option<String>,

    /// Page that opens share links
    #[arg(long)]
    pub share_url: Option<String>,

    /// Cache size limit in bytes (0 removes the limit)
    #[arg(long)]
    pub cache_quota: Option<u64>,
}

impl ConfigArgs {
    /// Apply the given settings. Returns false when none were given.
    pub fn apply(&self, config: &mut Config) -> bool {
        if let Some(url) = &self.api_url {
            config.api_base_url = Some(url.clone());
        }
        if let Some(url) = &self.share_url {
            config.share_base_url = Some(url.clone());
        }
        if let Some(quota) = self.cache_quota {
            config.cache_quota_bytes = (quota > 0).then_some(quota);
        }
        self.api_url.is_some() || self.share_url.is_some() || self.cache_quota.is_some()
    }
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List the collection
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show collection totals
    Stats,

    /// Toggle whether an item is owned
    Own {
        /// Item identifier
        id: String,
    },

    /// Toggle whether an item is a favorite
    Favorite {
        /// Item identifier
        id: String,
    },

    /// Show release dates and compatible games for an item
    Detail {
        /// Item identifier
        id: String,
    },

    /// Write owned and favorite flags to a JSON file
    Export {
        /// Output file (defaults to amiibo-collection.json)
        path: Option<PathBuf>,
    },

    /// Replace all flags with the contents of an exported file
    Import {
        path: PathBuf,
    },

    /// Print a link to the owned collection
    Share,

    /// Download details for every owned item so they are available offline
    Prefetch,

    /// Show what is cached and how old it is
    CacheStatus,

    /// Show or change saved settings
    Config {
        #[command(flatten)]
        settings: ConfigArgs,
    },
}

impl Commands {
    /// Whether the command works on the merged catalog view.
    pub fn needs_catalog(&self) -> bool {
        !matches!(
            self,
            Commands::Export { .. }
                | Commands::Import { .. }
                | Commands::CacheStatus
                | Commands::Config { .. }
        )
    }
}
