use std::path::PathBuf;

use clap::{Parser, Subcommand};

use charitable_api::feed::DEFAULT_FEED_LIMIT;

#[derive(Parser)]
#[command(name = "charitable", version, about = "Browse nonprofits, like posts and donate from a terminal")]
pub struct Cli {
    /// Backend base URL. Overrides CHARITABLE_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// SQLite file holding the guest identity.
    #[arg(long, global = true, env = "CHARITABLE_STATE_PATH", default_value = "charitable.db")]
    pub state: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Page through the public feed.
    Feed {
        #[arg(long, default_value_t = DEFAULT_FEED_LIMIT)]
        limit: u32,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// List nonprofits.
    Nonprofits,
    /// Show one nonprofit by slug.
    Nonprofit { slug: String },
    /// List a nonprofit's posts.
    Posts { nonprofit_id: String },
    /// Toggle the like on a post.
    Like { post_id: String },
    /// Start a checkout for an amount in cents.
    Donate {
        nonprofit_id: String,
        cents: u64,
        #[arg(long)]
        post: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        anonymous: bool,
    },
    /// Ask whether a checkout session's payment cleared.
    Verify { session_id: String },
    /// Print this installation's guest id.
    Whoami,
}
