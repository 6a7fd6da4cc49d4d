//! Blocking client for a MediaWiki-style action API.
//!
//! Covers exactly the calls the playlist core needs: revision content reads,
//! token-authenticated edits and deletions, and imageinfo URL resolution.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::WikiConfig;
use crate::storage::error::StorageError;
use crate::storage::{CommitOptions, ContentStorage};

pub struct WikiApi {
    agent: ureq::Agent,
    endpoint: String,
}

impl WikiApi {
    pub fn new(config: &WikiConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        Self {
            agent: builder.build(),
            endpoint: config.api_url.clone(),
        }
    }

    fn get_json(&self, params: &[(&str, &str)]) -> Result<Value, StorageError> {
        let mut request = self.agent.get(&self.endpoint);
        for (key, value) in params {
            request = request.query(key, value);
        }
        let body: Value = request.call()?.into_json()?;
        check_api_error(&body)?;
        Ok(body)
    }

    fn post_json(&self, form: &[(&str, &str)]) -> Result<Value, StorageError> {
        let body: Value = self.agent.post(&self.endpoint).send_form(form)?.into_json()?;
        check_api_error(&body)?;
        Ok(body)
    }

    fn csrf_token(&self) -> Result<String, StorageError> {
        let body = self.get_json(&[
            ("action", "query"),
            ("meta", "tokens"),
            ("format", "json"),
            ("formatversion", "2"),
        ])?;

        body["query"]["tokens"]["csrftoken"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| StorageError::Api {
                code: "no-token".into(),
                info: "token response without csrftoken".into(),
            })
    }
}

impl ContentStorage for WikiApi {
    fn fetch_content(&self, page_id: &str) -> Result<Option<String>, StorageError> {
        let body = self.get_json(&[
            ("action", "query"),
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("titles", page_id),
            ("formatversion", "2"),
            ("format", "json"),
        ])?;

        let page = &body["query"]["pages"][0];
        if page["missing"].as_bool() == Some(true) {
            return Ok(None);
        }

        // an existing page with no readable revision counts as blank
        let content = page["revisions"][0]["content"]
            .as_str()
            .unwrap_or_default();
        Ok(Some(content.to_string()))
    }

    fn commit_content(
        &self,
        page_id: &str,
        text: &str,
        summary: &str,
        options: &CommitOptions,
    ) -> Result<(), StorageError> {
        let token = self.csrf_token()?;

        let mut form = vec![
            ("action", "edit"),
            ("title", page_id),
            ("text", text),
            ("summary", summary),
            ("format", "json"),
            ("formatversion", "2"),
            ("token", token.as_str()),
        ];
        if options.no_create {
            form.push(("nocreate", "1"));
        }
        if options.create_only {
            form.push(("createonly", "1"));
        }
        if options.minor {
            form.push(("minor", "1"));
        }

        let body = self.post_json(&form)?;
        match body["edit"]["result"].as_str() {
            Some("Success") => {
                log::debug!("committed {page_id}: {summary}");
                Ok(())
            }
            other => Err(StorageError::Api {
                code: "edit-failed".into(),
                info: format!("unexpected edit result for {page_id}: {other:?}"),
            }),
        }
    }

    fn delete_page(&self, page_id: &str, reason: &str) -> Result<(), StorageError> {
        let token = self.csrf_token()?;
        self.post_json(&[
            ("action", "delete"),
            ("title", page_id),
            ("reason", reason),
            ("format", "json"),
            ("formatversion", "2"),
            ("token", token.as_str()),
        ])?;
        log::info!("deleted page {page_id}");
        Ok(())
    }

    fn resolve_file_urls(
        &self,
        file_keys: &[String],
    ) -> Result<HashMap<String, String>, StorageError> {
        if file_keys.is_empty() {
            return Ok(HashMap::new());
        }

        let titles = file_keys.join("|");
        let body = self.get_json(&[
            ("action", "query"),
            ("titles", titles.as_str()),
            ("prop", "imageinfo"),
            ("iiprop", "url"),
            ("formatversion", "2"),
            ("format", "json"),
        ])?;

        let mut urls = HashMap::new();
        if let Some(pages) = body["query"]["pages"].as_array() {
            for page in pages {
                let (Some(title), Some(url)) = (
                    page["title"].as_str(),
                    page["imageinfo"][0]["url"].as_str(),
                ) else {
                    continue;
                };
                urls.insert(title.to_string(), url.to_string());
            }
        }
        Ok(urls)
    }
}

/// Maps the API's error envelope onto the storage fault taxonomy.
fn check_api_error(body: &Value) -> Result<(), StorageError> {
    let error = &body["error"];
    if error.is_null() {
        return Ok(());
    }

    let code = error["code"].as_str().unwrap_or("unknown").to_string();
    let info = error["info"].as_str().unwrap_or_default().to_string();

    Err(match code.as_str() {
        "missingtitle" => StorageError::PageNotFound(info),
        "editconflict" => StorageError::EditConflict(info),
        "permissiondenied" | "protectedpage" | "cantdelete" | "writeapidenied" => {
            StorageError::PermissionDenied(info)
        }
        _ => StorageError::Api { code, info },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_mapping() {
        let ok = json!({"query": {}});
        assert!(check_api_error(&ok).is_ok());

        let missing = json!({"error": {"code": "missingtitle", "info": "gone"}});
        assert!(matches!(
            check_api_error(&missing),
            Err(StorageError::PageNotFound(_))
        ));

        let conflict = json!({"error": {"code": "editconflict", "info": "raced"}});
        assert!(matches!(
            check_api_error(&conflict),
            Err(StorageError::EditConflict(_))
        ));

        let denied = json!({"error": {"code": "permissiondenied", "info": "no"}});
        assert!(matches!(
            check_api_error(&denied),
            Err(StorageError::PermissionDenied(_))
        ));

        let other = json!({"error": {"code": "ratelimited", "info": "slow down"}});
        assert!(matches!(
            check_api_error(&other),
            Err(StorageError::Api { .. })
        ));
    }
}
