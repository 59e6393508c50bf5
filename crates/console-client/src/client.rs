use crate::Error;

/// Client of the console backend REST API.
/// It's cheap to clone, and clones share a connection pool.
#[derive(Clone)]
pub struct Client {
    // Base URL of the console API, under which `/api/kafkas/...` is resolved.
    base_url: url::Url,
    // HTTP client to use for REST requests.
    http_client: reqwest::Client,
    // User's access token, if authenticated.
    access_token: Option<String>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Client {
    /// Create a new Client with the given base URL and user agent.
    pub fn new(base_url: &url::Url, user_agent: &str) -> Self {
        Self {
            base_url: base_url.clone(),
            http_client: new_http_client(user_agent.to_string()),
            access_token: None,
        }
    }

    pub fn with_access_token(self, access_token: Option<String>) -> Self {
        Self {
            access_token,
            ..self
        }
    }

    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Resolve path `segments` against the base URL.
    /// Segments are percent-encoded as required.
    pub fn url_for(&self, segments: &[&str]) -> Result<url::Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Performs a GET request of the API and validates the successful
    /// response as a `T` document of the named `resource`.
    pub async fn api_get<T: serde::de::DeserializeOwned>(
        &self,
        resource: &'static str,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url_for(segments)?;
        let mut builder = self.http_client.get(url).query(query);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }
        let request = builder.build().map_err(Error::Network)?;
        tracing::debug!(url = %request.url(), method = "GET", "sending request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(Error::Network)?;
        let status = response.status();
        let body = response.bytes().await.map_err(Error::Network)?;

        if status.is_success() {
            tracing::trace!(body = %String::from_utf8_lossy(&body), %status, "got successful response");
            Ok(console_models::validate(resource, &body)?)
        } else {
            Err(Error::from_status(status, &body))
        }
    }
}

pub fn new_http_client(user_agent: String) -> reqwest::Client {
    reqwest::ClientBuilder::new()
        .user_agent(user_agent)
        .build()
        .expect("failed to build http client")
}
