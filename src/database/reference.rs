use super::snapshot::DataSnapshot;
use super::DatabaseError;
use crate::core::parse_database_error;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::ser::Error as SerError;
use serde::{Deserialize, Serialize};
use serde_json::Value as SerdeValue;
use url::Url;

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// A location in the database tree, plus optional query modifiers for reads.
#[derive(Clone)]
pub struct Reference<'a> {
    client: &'a ClientWithMiddleware,
    base_url: &'a str,
    segments: Vec<String>,
    params: Vec<(&'static str, String)>,
}

impl<'a> Reference<'a> {
    pub(crate) fn new(client: &'a ClientWithMiddleware, base_url: &'a str) -> Self {
        Self {
            client,
            base_url,
            segments: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Navigates to a child. Slashes in `segment` descend several levels; empty segments are
    /// ignored, so `"a//b/"` is the same as `"a/b"`.
    pub fn child(&self, segment: &str) -> Reference<'a> {
        let mut segments = self.segments.clone();
        segments.extend(
            segment
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );

        Reference {
            client: self.client,
            base_url: self.base_url,
            segments,
            params: Vec::new(),
        }
    }

    /// The last segment of the path, or `None` at the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The slash-delimited path from the root.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    pub fn order_by_key(mut self) -> Self {
        self.params.push(("orderBy", "\"$key\"".to_string()));
        self
    }

    pub fn order_by_child(mut self, field: &str) -> Self {
        self.params.push(("orderBy", SerdeValue::from(field).to_string()));
        self
    }

    pub fn limit_to_first(mut self, limit: u32) -> Self {
        self.params.push(("limitToFirst", limit.to_string()));
        self
    }

    pub fn limit_to_last(mut self, limit: u32) -> Self {
        self.params.push(("limitToLast", limit.to_string()));
        self
    }

    /// Only fetch one level of keys; nested objects come back as `true`.
    pub fn shallow(mut self) -> Self {
        self.params.push(("shallow", "true".to_string()));
        self
    }

    pub(crate) fn url(&self) -> Result<Url, DatabaseError> {
        let mut url =
            Url::parse(self.base_url).map_err(|e| DatabaseError::InvalidUrl(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| DatabaseError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            match self.segments.split_last() {
                Some((last, parents)) => {
                    path.extend(parents);
                    path.push(&format!("{}.json", last));
                }
                None => {
                    path.push(".json");
                }
            }
        }

        if !self.params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in &self.params {
                query.append_pair(name, value);
            }
        }

        Ok(url)
    }

    /// Reads the subtree at this location.
    pub async fn get(&self) -> Result<DataSnapshot, DatabaseError> {
        let url = self.url()?;
        tracing::debug!(path = %self.path(), "GET");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DatabaseError::ApiError(
                parse_database_error(response, "Get failed").await,
            ));
        }

        let value: SerdeValue = response.json().await?;
        Ok(DataSnapshot::new(self.key().map(str::to_string), value))
    }

    /// Replaces whatever is stored at this location with `value`.
    pub async fn set<T: Serialize>(&self, value: &T) -> Result<(), DatabaseError> {
        let url = self.url()?;
        tracing::debug!(path = %self.path(), "PUT");

        let response = self
            .client
            .put(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(value)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DatabaseError::ApiError(
                parse_database_error(response, "Set failed").await,
            ));
        }

        Ok(())
    }

    /// Appends `value` as a new child and returns the key the server generated for it.
    ///
    /// Generated keys sort lexicographically in creation order.
    pub async fn push<T: Serialize>(&self, value: &T) -> Result<String, DatabaseError> {
        let url = self.url()?;
        tracing::debug!(path = %self.path(), "POST");

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(value)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DatabaseError::ApiError(
                parse_database_error(response, "Push failed").await,
            ));
        }

        let pushed: PushResponse = response.json().await?;
        Ok(pushed.name)
    }

    /// Merges the fields of `value` into this location. Fields not named in `value` are kept.
    pub async fn update<T: Serialize>(&self, value: &T) -> Result<(), DatabaseError> {
        let fields = serde_json::to_value(value)?;
        if !fields.is_object() {
            return Err(DatabaseError::SerializationError(SerError::custom(
                "Can only update with an object of fields",
            )));
        }

        let url = self.url()?;
        tracing::debug!(path = %self.path(), "PATCH");

        let response = self
            .client
            .patch(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&fields)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DatabaseError::ApiError(
                parse_database_error(response, "Update failed").await,
            ));
        }

        Ok(())
    }

    /// Deletes this location and its whole subtree.
    pub async fn remove(&self) -> Result<(), DatabaseError> {
        let url = self.url()?;
        tracing::debug!(path = %self.path(), "DELETE");

        let response = self.client.delete(url).send().await?;

        if !response.status().is_success() {
            return Err(DatabaseError::ApiError(
                parse_database_error(response, "Remove failed").await,
            ));
        }

        Ok(())
    }
}
