//! HTTP Ladder Client
//!
//! `reqwest` implementation of [`LadderApi`]. Dropping a returned future
//! cancels the underlying request, which is what invalidation relies on.

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

use super::api::LadderApi;
use crate::constants::MODERATION_NOTE;
use crate::domain::config::ServerConfig;
use crate::domain::{Ladder, LadderId, PlayersPage};
use crate::error::{Error, Result};

/// REST client for the ladder endpoints
#[derive(Clone)]
pub struct HttpLadderApi {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpLadderApi {
    /// Create a client from the server configuration
    pub fn new(config: &ServerConfig) -> Result<Self> {
        if !config.base_url.ends_with('/') {
            return Err(Error::Invalid {
                message: format!("base_url must end with '/': {}", config.base_url),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Absolute URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(path));
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn get_json<T>(&self, path: String, query: Vec<(&'static str, String)>) -> BoxFuture<'static, Result<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request = self.request(Method::GET, &path).query(&query);
        async move {
            tracing::debug!("GET {} {:?}", path, query);
            let response = check_status("GET", request.send().await?)?;
            Ok(response.json::<T>().await?)
        }
        .boxed()
    }

    fn send(
        &self,
        method: Method,
        path: String,
        body: serde_json::Value,
    ) -> BoxFuture<'static, Result<()>> {
        let label = method_label(&method);
        let request = self.request(method, &path).json(&body);
        async move {
            tracing::info!("{} {}", label, path);
            check_status(label, request.send().await?)?;
            Ok(())
        }
        .boxed()
    }
}

fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        _ => "REQUEST",
    }
}

fn check_status(method: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Status {
            method,
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}

impl LadderApi for HttpLadderApi {
    fn ladder(&self, id: LadderId) -> BoxFuture<'static, Result<Ladder>> {
        self.get_json(format!("ladders/{id}"), Vec::new())
    }

    fn players_page(
        &self,
        id: LadderId,
        page: u32,
        page_size: usize,
    ) -> BoxFuture<'static, Result<PlayersPage>> {
        self.get_json(
            id.players_path(),
            vec![("page", page.to_string()), ("page_size", page_size.to_string())],
        )
    }

    fn join(&self, id: LadderId) -> BoxFuture<'static, Result<()>> {
        self.send(Method::POST, id.players_path(), json!({}))
    }

    fn leave(&self, id: LadderId) -> BoxFuture<'static, Result<()>> {
        self.send(Method::DELETE, id.players_path(), json!({}))
    }

    fn challenge(&self, id: LadderId, player_id: u64) -> BoxFuture<'static, Result<()>> {
        self.send(
            Method::POST,
            format!("{}/challenge", id.players_path()),
            json!({ "player_id": player_id }),
        )
    }

    fn moderate(
        &self,
        id: LadderId,
        player_id: u64,
        rank: u64,
    ) -> BoxFuture<'static, Result<()>> {
        self.send(
            Method::PUT,
            format!("{}/moderate", id.players_path()),
            json!({
                "moderation_note": MODERATION_NOTE,
                "player_id": player_id,
                "rank": rank,
            }),
        )
    }
}

impl std::fmt::Debug for HttpLadderApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLadderApi")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.api_token.is_some())
            .finish()
    }
}
