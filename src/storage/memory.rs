//! In-memory [`ContentStorage`] used by the operation tests and available to
//! embedders that want to run the core against a local page set.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::storage::error::StorageError;
use crate::storage::{CommitOptions, ContentStorage};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    pages: Mutex<HashMap<String, String>>,
    file_urls: Mutex<HashMap<String, String>>,
    /// When false, `delete_page` behaves like the API rejecting an
    /// unprivileged deletion.
    pub allow_delete: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            allow_delete: true,
            ..Self::default()
        }
    }

    pub fn with_page(self, page_id: &str, content: &str) -> Self {
        self.pages
            .lock()
            .expect("pages lock")
            .insert(page_id.to_string(), content.to_string());
        self
    }

    pub fn with_file_url(self, file_key: &str, url: &str) -> Self {
        self.file_urls
            .lock()
            .expect("urls lock")
            .insert(file_key.to_string(), url.to_string());
        self
    }

    pub fn page(&self, page_id: &str) -> Option<String> {
        self.pages.lock().expect("pages lock").get(page_id).cloned()
    }
}

impl ContentStorage for MemoryStorage {
    fn fetch_content(&self, page_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.page(page_id))
    }

    fn commit_content(
        &self,
        page_id: &str,
        text: &str,
        _summary: &str,
        options: &CommitOptions,
    ) -> Result<(), StorageError> {
        let mut pages = self.pages.lock().expect("pages lock");
        let exists = pages.contains_key(page_id);

        if options.no_create && !exists {
            return Err(StorageError::PageNotFound(page_id.to_string()));
        }
        if options.create_only && exists {
            return Err(StorageError::Api {
                code: "articleexists".into(),
                info: format!("{page_id} already exists"),
            });
        }

        pages.insert(page_id.to_string(), text.to_string());
        Ok(())
    }

    fn delete_page(&self, page_id: &str, _reason: &str) -> Result<(), StorageError> {
        if !self.allow_delete {
            return Err(StorageError::PermissionDenied(format!(
                "not allowed to delete {page_id}"
            )));
        }
        let mut pages = self.pages.lock().expect("pages lock");
        if pages.remove(page_id).is_none() {
            return Err(StorageError::PageNotFound(page_id.to_string()));
        }
        Ok(())
    }

    fn resolve_file_urls(
        &self,
        file_keys: &[String],
    ) -> Result<HashMap<String, String>, StorageError> {
        let urls = self.file_urls.lock().expect("urls lock");
        Ok(file_keys
            .iter()
            .filter_map(|key| urls.get(key).map(|url| (key.clone(), url.clone())))
            .collect())
    }
}
