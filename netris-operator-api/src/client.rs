use log::debug;
use reqwest::{header, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use crate::{error::ApiError, response::ApiResponse};

/// Authenticated session against a Netris controller. Cheap to share behind
/// an `Arc`; the session cookie is refreshed in place when it expires.
pub struct Client {
    http: reqwest::Client,
    base: Url,
    login: String,
    password: String,
    cookie: RwLock<Option<String>>,
}

impl Client {
    /// Builds an unauthenticated client. `host` may omit the scheme, in
    /// which case https is assumed. `insecure` disables certificate
    /// verification for controllers running self-signed setups.
    pub fn new(
        host: &str,
        login: impl Into<String>,
        password: impl Into<String>,
        insecure: bool,
    ) -> Result<Self, ApiError> {
        let address = if host.contains("://") {
            host.to_owned()
        } else {
            format!("https://{host}")
        };
        let base = Url::parse(&address).map_err(|_| ApiError::InvalidAddress(host.to_owned()))?;

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()?;

        Ok(Self {
            http,
            base,
            login: login.into(),
            password: password.into(),
            cookie: RwLock::new(None),
        })
    }

    /// Authenticates and stores the session cookie. Called once at startup;
    /// requests re-authenticate on their own when the session expires.
    pub async fn login(&self) -> Result<(), ApiError> {
        let url = self.url("/api/auth");
        let body = json!({ "user": self.login, "password": self.password });
        let reply = self.http.post(url).json(&body).send().await?;

        if reply.status() == StatusCode::UNAUTHORIZED || reply.status() == StatusCode::FORBIDDEN {
            return Err(ApiError::AuthRejected(self.login.clone()));
        }

        let session = reply
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .collect::<Vec<_>>()
            .join("; ");

        let envelope: ApiResponse = reply.json().await?;
        if !envelope.is_success {
            return Err(ApiError::AuthRejected(self.login.clone()));
        }

        debug!("Authenticated against the controller as '{}'", self.login);
        *self.cookie.write().await = Some(session);

        Ok(())
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    /// The link endpoint deletes by payload rather than by path.
    pub async fn delete_with_body<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::DELETE, path, Some(body)).await
    }

    /// GET + envelope check + list decode in one go.
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        self.get(path).await?.ok()?.decode()
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, ApiError> {
        let reply = self.send(method.clone(), path, body).await?;

        // Sessions expire server-side; retry once with fresh credentials.
        let reply = if reply.status() == StatusCode::UNAUTHORIZED {
            debug!("Session expired, re-authenticating");
            self.login().await?;
            self.send(method, path, body).await?
        } else {
            reply
        };

        Ok(reply.json().await?)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.request(method, self.url(path));

        if let Some(cookie) = self.cookie.read().await.as_deref() {
            request = request.header(header::COOKIE, cookie);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path.split('?').next().unwrap_or(path));
        if let Some(query) = path.split_once('?').map(|(_, q)| q) {
            url.set_query(Some(query));
        }
        url
    }
}
