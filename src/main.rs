use clap::Parser;
use site_audit::report::{
    LinkReport, MetadataIssuesReport, OpportunityReport, OrphanReport, OrphanSuggestionReport,
    RedirectReport,
};
use site_audit::{Audit, AuditConfig, redirects};
use std::process::ExitCode;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Findings never fail a run; only bad arguments or configuration do
async fn run(args: Args) -> site_audit::Result<()> {
    let config = match &args.config {
        Some(path) => {
            ::log::info!("Loading configuration from {}", path.display());
            AuditConfig::from_file(path)?
        }
        None => AuditConfig::default(),
    };
    if let Some(directory) = args.command.directory() {
        ::log::info!("Auditing site at {}", directory.display());
    }

    match args.command {
        Command::Links {
            directory,
            skip_external,
            site_url,
        } => {
            let mut audit = Audit::new(directory)
                .with_config(config)
                .with_skip_external(skip_external);
            if let Some(site_url) = site_url {
                audit = audit.with_site_url(site_url);
            }
            let report = audit.check_links().await?;
            println!("{}", LinkReport(&report));
        }
        Command::Orphans { directory } => {
            let orphans = Audit::new(directory).with_config(config).orphans()?;
            println!("{}", OrphanReport(&orphans));
        }
        Command::Opportunities { directory } => {
            let (site, suggestions) = Audit::new(directory).with_config(config).opportunities()?;
            println!(
                "{}",
                OpportunityReport {
                    suggestions: &suggestions,
                    site: &site,
                }
            );
        }
        Command::OrphanLinks { directory } => {
            let (site, orphans, suggestions) = Audit::new(directory)
                .with_config(config)
                .orphan_suggestions()?;
            println!(
                "{}",
                OrphanSuggestionReport {
                    orphans: &orphans,
                    suggestions: &suggestions,
                    site: &site,
                }
            );
        }
        Command::Metadata { directory } => {
            let report = Audit::new(directory).with_config(config).audit_metadata()?;
            println!("{}", MetadataIssuesReport(&report));
        }
        Command::Sitemap {
            directory,
            base_url,
        } => {
            let output = Audit::new(directory)
                .with_config(config)
                .write_sitemap(base_url.as_deref())?;
            println!("Sitemap written: {}", output.display());
        }
        Command::Redirects { url } => {
            let result = redirects::trace_redirects(&url, &config).await;
            println!(
                "{}",
                RedirectReport {
                    url: &url,
                    result: &result,
                }
            );
        }
    }

    Ok(())
}
