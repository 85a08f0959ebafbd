use crate::crawlers::filesystem::{self, site_root};
use crate::error::{Error, Result};
use crate::resolve::INDEX_FILE;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

pub const SITEMAP_FILE: &str = "sitemap.xml";

const HOMEPAGE_PRIORITY: &str = "1.0";
const PAGE_PRIORITY: &str = "0.8";
const CHANGEFREQ: &str = "monthly";

/// One `<url>` of the sitemap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    /// Site-relative path of the page the entry was built from
    pub path: String,
    pub loc: String,
    /// `YYYY-MM-DD`, local date of the file's modification time
    pub lastmod: String,
    pub priority: &'static str,
}

/// Public URL of a page: `index.html` stands for its directory and no URL
/// ends with a slash, so the home page is `base_url` itself
///
/// Each path segment is percent-encoded.
pub fn page_url(base_url: &str, relative_path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = match relative_path.rsplit_once('/') {
        Some((dir, INDEX_FILE)) => dir,
        None if relative_path == INDEX_FILE => "",
        _ => relative_path,
    }
    .trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
    format!("{base}/{}", encoded.join("/"))
}

/// Builds one entry per `.html` file under `root`, sorted by path
pub fn entries(root: impl AsRef<Path>, base_url: &str) -> Result<Vec<SitemapEntry>> {
    let root = site_root(root.as_ref())?;
    let homepage = page_url(base_url, "");

    let mut entries = Vec::new();
    for path in filesystem::discover_html_files(&root)? {
        let relative = filesystem::relative_path(&root, &path);
        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(|e| Error::read(&path, e))?;
        let loc = page_url(base_url, &relative);
        let priority = if loc == homepage {
            HOMEPAGE_PRIORITY
        } else {
            PAGE_PRIORITY
        };
        entries.push(SitemapEntry {
            path: relative,
            loc,
            lastmod: DateTime::<Local>::from(modified).format("%Y-%m-%d").to_string(),
            priority,
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Serializes entries as a sitemap protocol document
pub fn render(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}</loc>\n",
            html_escape::encode_text(&entry.loc)
        ));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
        xml.push_str(&format!("    <changefreq>{CHANGEFREQ}</changefreq>\n"));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Sitemap for the site at `root` as a string
pub fn generate(root: impl AsRef<Path>, base_url: &str) -> Result<String> {
    Ok(render(&entries(root, base_url)?))
}

/// Writes `sitemap.xml` at the root of the site and returns its path
pub fn write_sitemap(root: impl AsRef<Path>, base_url: &str) -> Result<PathBuf> {
    let root = root.as_ref();
    let entries = entries(root, base_url)?;
    let output = root.join(SITEMAP_FILE);
    fs::write(&output, render(&entries))?;
    ::log::info!(
        "Wrote {} entries to {}",
        entries.len(),
        output.display()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<p>x</p>").unwrap();
    }

    #[test]
    fn test_page_url() {
        let base = "https://lab.example.org/";
        assert_eq!(page_url(base, "index.html"), "https://lab.example.org");
        assert_eq!(page_url(base, "ensino/index.html"), "https://lab.example.org/ensino");
        assert_eq!(page_url(base, "sobre.html"), "https://lab.example.org/sobre.html");
        assert_eq!(page_url(base, "myindex.html"), "https://lab.example.org/myindex.html");
        assert_eq!(
            page_url(base, "sobre nós.html"),
            "https://lab.example.org/sobre%20n%C3%B3s.html"
        );
        assert_eq!(
            page_url(base, "pesquisa e ensino/index.html"),
            "https://lab.example.org/pesquisa%20e%20ensino"
        );
    }

    #[test]
    fn test_one_entry_per_page() {
        let dir = TempDir::new().unwrap();
        for page in ["index.html", "sobre.html", "ensino/index.html", "ensino/p&d.html"] {
            write(dir.path(), page);
        }
        write(dir.path(), "css/site.css");

        let entries = entries(dir.path(), "https://lab.example.org/").unwrap();
        let locs: Vec<_> = entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec![
                "https://lab.example.org/ensino",
                "https://lab.example.org/ensino/p%26d.html",
                "https://lab.example.org",
                "https://lab.example.org/sobre.html",
            ]
        );

        let priorities: Vec<_> = entries.iter().map(|e| e.priority).collect();
        assert_eq!(priorities, vec!["0.8", "0.8", "1.0", "0.8"]);

        let modified = fs::metadata(dir.path().join("index.html"))
            .unwrap()
            .modified()
            .unwrap();
        let expected = DateTime::<Local>::from(modified).format("%Y-%m-%d").to_string();
        assert_eq!(entries[2].lastmod, expected);
    }

    #[test]
    fn test_written_sitemap() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html");
        write(dir.path(), "sobre nós.html");

        let output = write_sitemap(dir.path(), "https://lab.example.org").unwrap();
        assert_eq!(output, dir.path().join("sitemap.xml"));

        let xml = fs::read_to_string(output).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset"));
        assert_eq!(xml.matches("<url>").count(), 2);
        assert!(xml.contains("<loc>https://lab.example.org/sobre%20n%C3%B3s.html</loc>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }
}
