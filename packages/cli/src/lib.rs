//! Command line front end for pagekit.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;

/// pagekit - inspect and edit workspace pages from the command line
#[derive(Parser, Debug)]
#[command(name = "pagekit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config dir>/pagekit/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show a block's title, type and attributes
    Block {
        /// Block id or page URL
        target: String,
    },
    /// List a block's children in order
    Children {
        /// Block id or page URL
        target: String,
    },
    /// List the rows of a collection
    Rows {
        /// Collection id
        collection: String,
        /// Only rows matching this text
        #[arg(long, short)]
        query: Option<String>,
    },
    /// Set one property of a block
    Set {
        /// Block id or page URL
        target: String,
        /// `title`, or a property name or id from the collection schema
        property: String,
        value: String,
    },
    /// Create a block under a parent
    Create {
        /// Parent block id or page URL
        parent: String,
        /// Block type, e.g. `page` or `text`
        #[arg(long = "type", short = 't', default_value = "page")]
        block_type: String,
        #[arg(long)]
        title: Option<String>,
    },
}

/// Load configuration, connect and run one command.
pub fn run(cli: &Cli) -> pagekit::Result<String> {
    let config = pagekit::ClientConfig::load(cli.config.as_deref())?;
    let client = pagekit::Client::new(config)?;
    commands::execute(&client, &cli.command)
}
