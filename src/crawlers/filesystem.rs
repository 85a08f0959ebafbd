use crate::error::{Error, Result};
use crate::parsers;
use crate::results::Document;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every HTML page of a built site, keyed by site-relative path
///
/// Loaded once per run; analyses only read from it.
#[derive(Debug, Clone)]
pub struct Site {
    root: PathBuf,
    documents: BTreeMap<String, Document>,
}

impl Site {
    /// Walks `root` and parses every `.html` file below it
    ///
    /// A page that cannot be read is kept as an empty [`Document`] carrying
    /// the error, so one bad file never stops the audit of the others.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = site_root(root.as_ref())?;
        ::log::info!("Loading pages from {}", root.display());

        let mut documents = BTreeMap::new();
        for path in discover_html_files(&root)? {
            let relative = relative_path(&root, &path);
            let document = match load_page(&root, &path) {
                Ok(document) => document,
                Err(e) => {
                    ::log::warn!("Failed to load {}: {}", relative, e);
                    Document::failed(relative.clone(), e.to_string())
                }
            };
            documents.insert(relative, document);
        }

        ::log::info!("Loaded {} pages", documents.len());
        Ok(Self { root, documents })
    }

    /// Builds a site from already parsed documents
    pub fn from_documents(root: impl Into<PathBuf>, documents: Vec<Document>) -> Self {
        Self {
            root: root.into(),
            documents: documents
                .into_iter()
                .map(|d| (d.relative_path.clone(), d))
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents(&self) -> &BTreeMap<String, Document> {
        &self.documents
    }

    pub fn get(&self, relative_path: &str) -> Option<&Document> {
        self.documents.get(relative_path)
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.documents.contains_key(relative_path)
    }

    /// Page paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Checks that `root` is a directory and makes it absolute
pub fn site_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }
    Ok(std::path::absolute(root)?)
}

/// Finds all `.html` files under `root`, sorted by path
///
/// Entries the walker cannot read are logged and skipped.
pub fn discover_html_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                ::log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && parsers::is_html_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    ::log::debug!("Found {} HTML files under {}", files.len(), root.display());
    Ok(files)
}

/// Site-relative, forward-slash, percent-decoded form of `path`
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    match urlencoding::decode(&joined) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => joined,
    }
}

/// Reads and parses one page
pub fn load_page(root: &Path, path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    Ok(parsers::parse_page(&relative_path(root, path), &content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_walks_recursively() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", b"<title>Home</title>");
        write(dir.path(), "ensino/index.html", b"<title>Ensino</title>");
        write(dir.path(), "style.css", b"body {}");

        let site = Site::load(dir.path()).unwrap();
        let paths: Vec<_> = site.paths().collect();
        assert_eq!(paths, vec!["ensino/index.html", "index.html"]);
        assert_eq!(site.get("ensino/index.html").unwrap().title, "Ensino");
    }

    #[test]
    fn test_unreadable_page_is_kept_with_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.html", b"<title>Good</title>");
        write(dir.path(), "bad.html", &[0xff, 0xfe, 0x00, 0xc3]);

        let site = Site::load(dir.path()).unwrap();
        assert_eq!(site.len(), 2);

        let bad = site.get("bad.html").unwrap();
        assert!(bad.load_error.is_some());
        assert!(bad.title.is_empty());
        assert_eq!(site.get("good.html").unwrap().title, "Good");
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("public_html");
        assert!(matches!(
            Site::load(&missing),
            Err(Error::NotADirectory(_))
        ));
    }

    #[test]
    fn test_relative_path_is_decoded() {
        let root = Path::new("/site");
        assert_eq!(
            relative_path(root, Path::new("/site/docs/caf%C3%A9.html")),
            "docs/café.html"
        );
    }
}
