pub mod html;
pub mod text;


use crate::results::Document;
use std::path::Path;

/// Whether a file should be loaded as a page of the site
pub fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}

/// Parses page content into a document keyed by its site-relative path
pub fn parse_page(relative_path: &str, content: &str) -> Document {
    html::parse(relative_path, content)
}
