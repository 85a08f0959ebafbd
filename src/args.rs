use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-audit")]
#[command(about = "Audits a built static site: links, orphans, link opportunities, metadata and sitemap")]
#[command(version)]
pub struct Args {
    /// JSON configuration file; command-line flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Report broken internal and external links
    Links {
        /// Root directory of the generated site (e.g. public_html)
        directory: PathBuf,

        /// Do not request external links; faster and works offline
        #[arg(long)]
        skip_external: bool,

        /// Site URL announced in the User-Agent of outbound requests
        #[arg(long)]
        site_url: Option<String>,
    },

    /// List pages no internal link points to
    Orphans {
        /// Root directory of the generated site
        directory: PathBuf,
    },

    /// Suggest internal links between pages that share topic terms
    Opportunities {
        /// Root directory of the generated site
        directory: PathBuf,
    },

    /// Suggest pages that could link to each orphan page
    OrphanLinks {
        /// Root directory of the generated site
        directory: PathBuf,
    },

    /// Audit SEO, Open Graph and Twitter Card metadata
    Metadata {
        /// Root directory of the generated site
        directory: PathBuf,
    },

    /// Write sitemap.xml at the root of the site
    Sitemap {
        /// Root directory of the generated site
        directory: PathBuf,

        /// Public base URL of the site; defaults to the configured site URL
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show the redirect chain of a URL
    Redirects {
        /// Full URL to trace (e.g. http://www.example.org)
        url: String,
    },
}

impl Command {
    /// The site directory the command works on, if any
    pub fn directory(&self) -> Option<&PathBuf> {
        match self {
            Command::Links { directory, .. }
            | Command::Orphans { directory }
            | Command::Opportunities { directory }
            | Command::OrphanLinks { directory }
            | Command::Metadata { directory }
            | Command::Sitemap { directory, .. } => Some(directory),
            Command::Redirects { .. } => None,
        }
    }
}
