//! Human-readable renderings of every analysis, printed to stdout.

use crate::checker::CheckReport;
use crate::crawlers::filesystem::Site;
use crate::error::Error;
use crate::graph::Orphans;
use crate::metadata::MetadataReport;
use crate::redirects::RedirectTrace;
use crate::results::is_homepage;
use crate::suggest::{REPORT_LIMIT, Suggestions, topic_terms};
use std::fmt;

const RULE: &str = "----------------------------------------";
const WIDE_RULE: &str =
    "=====================================================================================";

fn title_of<'a>(site: &'a Site, path: &str) -> &'a str {
    site.get(path)
        .map(|document| document.title.as_str())
        .filter(|title| !title.is_empty())
        .unwrap_or("N/A")
}

/// Broken links with their page, tag and reason
pub struct LinkReport<'a>(pub &'a CheckReport);

impl fmt::Display for LinkReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        if report.issues.is_empty() {
            writeln!(f, "No broken links found.")?;
        } else {
            writeln!(f, "--- BROKEN LINKS FOUND ---")?;
            for issue in &report.issues {
                writeln!(f, "  Source page:  {}", issue.source_path)?;
                writeln!(f, "  HTML tag:     {}", issue.offending_tag)?;
                writeln!(f, "  Broken URL:   {}", issue.href)?;
                writeln!(f, "  Status/error: {}", issue.reason)?;
                writeln!(f, "  ------------------------------------")?;
            }
            writeln!(f, "Total broken links: {}", report.issues.len())?;
        }
        writeln!(
            f,
            "Pages: {}, links checked: {}, skipped: {}",
            report.pages, report.checked, report.skipped
        )?;
        writeln!(f, "{RULE}")
    }
}

/// Orphan pages, with the home page annotated
pub struct OrphanReport<'a>(pub &'a Orphans);

impl fmt::Display for OrphanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let orphans = self.0;
        if orphans.is_empty() {
            writeln!(f, "No orphan pages found.")?;
            return writeln!(f, "{RULE}");
        }

        writeln!(f, "--- ORPHAN PAGES FOUND ---")?;
        writeln!(
            f,
            "These pages exist in the site but no internal link points to them:"
        )?;
        for page in orphans.iter() {
            if is_homepage(page) {
                writeln!(f, "  - {page} (home page, usually reached directly)")?;
            } else {
                writeln!(f, "  - {page}")?;
            }
        }
        writeln!(f, "\nTotal orphan pages found: {}", orphans.len())?;
        writeln!(
            f,
            "Consider linking to them from relevant content, or removing them if they are drafts."
        )?;
        writeln!(f, "{RULE}")
    }
}

/// Full-site internal link opportunities, top suggestions per target
pub struct OpportunityReport<'a> {
    pub suggestions: &'a Suggestions,
    pub site: &'a Site,
}

impl fmt::Display for OpportunityReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let site = self.site;
        let mut shown = 0;

        writeln!(f, "--- INTERNAL LINK OPPORTUNITIES ---")?;
        writeln!(
            f,
            "Review every suggestion: matches are lexical and may be coincidental.\n"
        )?;

        for (target, suggestions) in self.suggestions {
            let Some(document) = site.get(target) else {
                continue;
            };
            let keywords: Vec<_> = document.meta_keywords.iter().map(String::as_str).collect();

            writeln!(f, "{WIDE_RULE}")?;
            writeln!(f, "TARGET PAGE (link to): {target}")?;
            writeln!(f, "   Title: \"{}\"", title_of(site, target))?;
            writeln!(f, "   Keywords (filtered): [{}]", keywords.join(", "))?;
            writeln!(f, "   Source pages (link from):")?;

            if suggestions.is_empty() {
                writeln!(f, "     No source page shares significant terms.")?;
            }
            for (i, suggestion) in suggestions.iter().take(REPORT_LIMIT).enumerate() {
                let terms: Vec<_> = suggestion.matched_terms.iter().map(String::as_str).collect();
                writeln!(f, "\n     Suggestion #{}:", i + 1)?;
                writeln!(f, "       Source page: {}", suggestion.source_page)?;
                writeln!(
                    f,
                    "          Source title: \"{}\"",
                    title_of(site, &suggestion.source_page)
                )?;
                writeln!(
                    f,
                    "          Matched terms ({}): {}",
                    suggestion.match_count,
                    terms.join(", ")
                )?;
                match &suggestion.context_snippet {
                    Some(snippet) => writeln!(f, "          Context: {snippet}")?,
                    None => writeln!(f, "          Context: [no snippet available]")?,
                }
                writeln!(
                    f,
                    "          Action: consider adding a link from '{}' to '{}'.",
                    suggestion.source_page, target
                )?;
                shown += 1;
            }
            writeln!(f, "{WIDE_RULE}\n")?;
        }

        if shown == 0 {
            writeln!(f, "No internal link opportunity found with the current criteria.")?;
        } else {
            writeln!(f, "Total suggestions shown: {shown}")?;
        }
        writeln!(f, "{RULE}")
    }
}

/// Orphans with titles, then the pages that could link to each one
pub struct OrphanSuggestionReport<'a> {
    pub orphans: &'a Orphans,
    pub suggestions: &'a Suggestions,
    pub site: &'a Site,
}

impl fmt::Display for OrphanSuggestionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let site = self.site;
        if self.orphans.is_empty() {
            writeln!(f, "No orphan pages found. Nothing to suggest.")?;
            return writeln!(f, "{RULE}");
        }

        writeln!(f, "Found {} orphan page(s):", self.orphans.len())?;
        for orphan in self.orphans.iter() {
            writeln!(f, "  - {orphan} (title: {})", title_of(site, orphan))?;
        }

        writeln!(f, "\n--- Link suggestions for orphan pages ---")?;
        for orphan in self.orphans.iter() {
            writeln!(
                f,
                "\n  For orphan page: {orphan} (title: \"{}\")",
                title_of(site, orphan)
            )?;
            let suggestions = self.suggestions.get(orphan).filter(|list| !list.is_empty());
            let Some(suggestions) = suggestions else {
                let reason = match site.get(orphan) {
                    Some(document) if topic_terms(document).is_empty() => {
                        "no title words or keywords to match on"
                    }
                    _ => "no source page shares its keywords",
                };
                writeln!(f, "     No automatic suggestion: {reason}.")?;
                continue;
            };
            writeln!(f, "     Consider adding a link from:")?;
            for suggestion in suggestions.iter().take(REPORT_LIMIT) {
                writeln!(
                    f,
                    "       - {} (title: \"{}\") - {} term(s) in common.",
                    suggestion.source_page,
                    title_of(site, &suggestion.source_page),
                    suggestion.match_count
                )?;
            }
        }
        writeln!(f, "{RULE}")
    }
}

/// Metadata issues grouped by page
pub struct MetadataIssuesReport<'a>(pub &'a MetadataReport);

impl fmt::Display for MetadataIssuesReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        if report.issues.is_empty() {
            writeln!(f, "No metadata problems found in {} pages.", report.pages)?;
            return writeln!(f, "{RULE}");
        }

        writeln!(f, "--- METADATA PROBLEMS FOUND ---")?;
        for (path, issues) in &report.issues {
            writeln!(f, "\n  File: {path}")?;
            for issue in issues {
                writeln!(f, "    - {issue}")?;
            }
        }
        writeln!(
            f,
            "\nFiles with metadata problems: {} of {}",
            report.issues.len(),
            report.pages
        )?;
        writeln!(f, "{RULE}")
    }
}

/// A redirect chain, or why it could not be traced
pub struct RedirectReport<'a> {
    pub url: &'a str,
    pub result: &'a Result<RedirectTrace, Error>,
}

impl fmt::Display for RedirectReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Checking redirects for: {}\n", self.url)?;
        let trace = match self.result {
            Ok(trace) => trace,
            Err(Error::Http(e)) if e.is_timeout() => {
                return writeln!(
                    f,
                    "Error: timeout. The request to '{}' took too long to answer.",
                    self.url
                );
            }
            Err(Error::TooManyRedirects(limit)) => {
                return writeln!(
                    f,
                    "Error: more than {limit} redirects. '{}' is probably in a redirect loop.",
                    self.url
                );
            }
            Err(e) => return writeln!(f, "Error requesting '{}': {e}", self.url),
        };

        if !trace.redirected() {
            writeln!(f, "No redirects.")?;
            writeln!(f, "Final URL: {}", trace.final_url)?;
            return writeln!(f, "-> Status: {} {}", trace.final_status, trace.final_reason);
        }

        writeln!(f, "--- Redirect chain ---")?;
        for (i, hop) in trace.hops.iter().enumerate() {
            writeln!(f, "{}. Redirect from: {}", i + 1, hop.url)?;
            writeln!(f, "   -> Status: {} {}", hop.status, hop.reason)?;
            writeln!(f, "   -> To:     {}", hop.location)?;
            writeln!(f, "--------------------")?;
        }
        writeln!(f, "\n--- Final page ---")?;
        writeln!(f, "Final URL: {}", trace.final_url)?;
        writeln!(f, "-> Final status: {} {}", trace.final_status, trace.final_reason)
    }
}
