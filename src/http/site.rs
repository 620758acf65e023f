//! Page and static file locations.
//!
//! Pages are served as-is; there is no template rendering.

use std::path::{Path, PathBuf};

use tower_http::services::{ServeDir, ServeFile};

use crate::config::SiteConfig;

/// Resolved site layout.
#[derive(Debug, Clone)]
pub struct Site {
    root: PathBuf,
    index_page: PathBuf,
    message_page: PathBuf,
    not_found_page: PathBuf,
}

impl Site {
    pub fn from_config(config: &SiteConfig) -> Self {
        let root = PathBuf::from(&config.root);
        Self {
            index_page: root.join(&config.index_page),
            message_page: root.join(&config.message_page),
            not_found_page: root.join(&config.not_found_page),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Page for `GET /`.
    pub fn index(&self) -> ServeFile {
        ServeFile::new(&self.index_page)
    }

    /// Page for `GET /message`.
    pub fn message(&self) -> ServeFile {
        ServeFile::new(&self.message_page)
    }

    /// Files under the root; anything missing gets the error page with 404.
    ///
    /// Content type comes from the file extension. Paths escaping the root
    /// are treated as missing.
    pub fn static_files(&self) -> ServeDir<tower_http::set_status::SetStatus<ServeFile>> {
        ServeDir::new(&self.root)
            .append_index_html_on_directories(false)
            .not_found_service(ServeFile::new(&self.not_found_page))
    }
}
