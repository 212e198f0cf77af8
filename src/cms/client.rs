//! Client for the Kantan CMS content API.
//!
//! Every operation builds an [`ApiRequest`] and hands it to
//! [`CmsClient::send`], which authenticates, dispatches and decodes it.
//! Payloads are returned verbatim as [`serde_json::Value`].

use std::fmt::Display;

use reqwest::Method;
use serde_json::Value;

use crate::cms::error::{CmsError, CmsResult};
use crate::config::{CmsConfig, Credentials};

/// Header carrying the project identifier.
pub const PROJECT_ID_HEADER: &str = "X-Project-Id";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Default page size for list operations.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default page number for list operations (1-based).
pub const DEFAULT_PAGE_NUM: u32 = 1;

/// A single API call: method, path below the API root, query and body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    /// Creates a request with no query and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl Display) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends a query parameter only when a value is present.
    ///
    /// `None` leaves the key out of the query string entirely.
    #[must_use]
    pub fn query_opt(self, key: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The path below the API root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// The JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Authenticated client for `{base_url}/v1/api`.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    api_root: String,
    credentials: Credentials,
}

impl CmsClient {
    /// Creates a client from the runtime configuration.
    ///
    /// Credentials are already validated by [`CmsConfig`], so a client can
    /// never exist without them.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &CmsConfig) -> CmsResult<Self> {
        Ok(Self::with_http_client(crate::cms::http_client()?, config))
    }

    /// Creates a client around an existing HTTP client.
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, config: &CmsConfig) -> Self {
        Self {
            http,
            api_root: format!("{}/v1/api", config.base_url),
            credentials: config.credentials.clone(),
        }
    }

    /// The API root all request paths are appended to.
    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Sends a request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// - [`CmsError::Transport`] if the request cannot be completed
    /// - [`CmsError::Http`] if the status is 400 or above
    /// - [`CmsError::Decode`] if the body is not JSON
    pub async fn send(&self, request: ApiRequest) -> CmsResult<Value> {
        let url = format!("{}{}", self.api_root, request.path);
        tracing::debug!(method = %request.method, url = %url, "Sending CMS request");

        let mut builder = self
            .http
            .request(request.method, &url)
            .header(PROJECT_ID_HEADER, self.credentials.project_id())
            .header(API_KEY_HEADER, self.credentials.api_key());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CmsError::transport(url.as_str(), e))?;
        let text = crate::cms::read_checked(response, &url).await?;

        serde_json::from_str(&text).map_err(|source| CmsError::Decode { url, source })
    }

    // Collections

    /// Lists collections in the project.
    ///
    /// `page_size` and `page_num` are always sent; `resp` only when given.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::send`].
    pub async fn list_collections(
        &self,
        page_size: u32,
        page_num: u32,
        resp: Option<&str>,
    ) -> CmsResult<Value> {
        let request = ApiRequest::get("/collections/")
            .query("page_size", page_size)
            .query("page_num", page_num)
            .query_opt("resp", resp);
        self.send(request).await
    }

    /// Counts collections in the project.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::send`].
    pub async fn count_collections(&self) -> CmsResult<Value> {
        self.send(ApiRequest::get("/collections_count/")).await
    }

    /// Fetches one collection.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::send`].
    pub async fn get_collection(&self, collection_id: &str) -> CmsResult<Value> {
        self.send(ApiRequest::get(format!("/collections/{collection_id}")))
            .await
    }

    // Records

    /// Lists records in a collection.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::send`].
    pub async fn list_records(
        &self,
        collection_id: &str,
        page_size: u32,
        page_num: u32,
    ) -> CmsResult<Value> {
        let request = ApiRequest::get(format!("/collections/{collection_id}/records/"))
            .query("page_size", page_size)
            .query("page_num", page_num);
        self.send(request).await
    }

    /// Fetches one record.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::send`].
    pub async fn get_record(&self, collection_id: &str, record_id: &str) -> CmsResult<Value> {
        self.send(ApiRequest::get(format!(
            "/collections/{collection_id}/records/{record_id}"
        )))
        .await
    }

    /// Counts records in a collection.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::send`].
    pub async fn count_records(&self, collection_id: &str) -> CmsResult<Value> {
        self.send(ApiRequest::get(format!(
            "/collections/{collection_id}/records_count/"
        )))
        .await
    }

    // API keys

    /// Checks the configured API key against the CMS.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::send`].
    pub async fn validate_api_key(&self) -> CmsResult<Value> {
        self.send(ApiRequest::get("/api_key/validate")).await
    }

    // Schemas

    /// Fetches the field-key to field-type mapping of a collection.
    ///
    /// # Errors
    ///
    /// See [`CmsClient::send`].
    pub async fn get_schema_type(&self, collection_id: &str) -> CmsResult<Value> {
        self.send(ApiRequest::get(format!(
            "/collections/{collection_id}/schema_type"
        )))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_opt_omits_absent_values() {
        let request = ApiRequest::get("/collections/")
            .query("page_size", 10)
            .query("page_num", 1)
            .query_opt("resp", None::<&str>);

        let keys: Vec<_> = request.query_pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["page_size", "page_num"]);
    }

    #[test]
    fn query_opt_keeps_present_values() {
        let request = ApiRequest::get("/collections/").query_opt("resp", Some("simple"));
        assert_eq!(
            request.query_pairs(),
            [("resp".to_string(), "simple".to_string())]
        );
    }

    #[test]
    fn json_body_is_attached() {
        let request = ApiRequest::new(Method::POST, "/x").json(serde_json::json!({"a": 1}));
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/x");
        assert_eq!(request.body(), Some(&serde_json::json!({"a": 1})));
    }

    #[test]
    fn api_root_appends_version_prefix() {
        let creds = Credentials::new("p", "k").unwrap();
        let config = CmsConfig::new(creds, "https://api.kantan-cms.com/");
        let client = CmsClient::with_http_client(reqwest::Client::new(), &config);
        assert_eq!(client.api_root(), "https://api.kantan-cms.com/v1/api");
    }
}
