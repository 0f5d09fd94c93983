use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::{AuthSession, DataPlatform, Direction, Filter, PlatformError, Query};

/// A hosted PostgREST/GoTrue compatible platform.
///
/// Requests carry the public API key and, once scoped, the caller's access
/// token, so the platform's row-level security sees the real user.
#[derive(Clone)]
pub struct RestPlatform {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct AuthUser {
    id: Uuid,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

impl RestPlatform {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        RestPlatform {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: None,
        }
    }

    fn url(&self, path: &str, pairs: &[(String, String)]) -> Result<Url, PlatformError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| PlatformError::Storage(format!("invalid platform url: {}", e)))?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs.iter());
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    fn rest_path(table: &str) -> String {
        format!("/rest/v1/{}", table)
    }

    async fn token_request(&self, url: Url, body: Value) -> Result<AuthSession, PlatformError> {
        let response = self.request(Method::POST, url).json(&body).send().await?;
        if matches!(response.status(), StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            return Err(PlatformError::InvalidCredentials);
        }
        let token: TokenResponse = check(response).await?.json().await?;
        match (token.access_token, token.user) {
            (Some(access_token), Some(user)) => Ok(AuthSession {
                access_token,
                user_id: user.id,
            }),
            _ => Err(PlatformError::Storage(
                "cadastro criado; confirme o e-mail antes de entrar".into(),
            )),
        }
    }
}

/// Turns non-2xx answers into [`PlatformError::Status`] with the body text.
async fn check(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PlatformError::Status {
        status: status.as_u16(),
        body,
    })
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn list_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => literal(other),
    }
}

/// PostgREST query parameters for a set of filters.
pub fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| {
            let value = match filter {
                Filter::Eq(_, v) => format!("eq.{}", literal(v)),
                Filter::In(_, values) => format!(
                    "in.({})",
                    values.iter().map(list_literal).collect::<Vec<_>>().join(",")
                ),
                Filter::IsNull(_) => "is.null".to_string(),
            };
            (filter.column().to_string(), value)
        })
        .collect()
}

/// PostgREST query parameters for a full select.
pub fn select_pairs(query: &Query) -> Vec<(String, String)> {
    let select = match &query.join {
        Some(join) => format!("*,{}!inner(*)", join.table),
        None => "*".to_string(),
    };
    let mut pairs = vec![("select".to_string(), select)];
    pairs.extend(filter_pairs(&query.filters));
    if let Some((column, direction)) = &query.order {
        let direction = match direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        pairs.push(("order".to_string(), format!("{}.{}", column, direction)));
    }
    if let Some((offset, limit)) = query.range {
        pairs.push(("offset".to_string(), offset.to_string()));
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

#[async_trait]
impl DataPlatform for RestPlatform {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, PlatformError> {
        let url = self.url(&Self::rest_path(query.table), &select_pairs(query))?;
        debug!("GET {}", url);
        let response = self.request(Method::GET, url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn insert(&self, table: &'static str, rows: Vec<Value>) -> Result<Vec<Value>, PlatformError> {
        let url = self.url(&Self::rest_path(table), &[])?;
        debug!("POST {} ({} rows)", url, rows.len());
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn update(&self, table: &'static str, patch: Value, filters: &[Filter]) -> Result<(), PlatformError> {
        let url = self.url(&Self::rest_path(table), &filter_pairs(filters))?;
        debug!("PATCH {}", url);
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete(&self, table: &'static str, filters: &[Filter]) -> Result<(), PlatformError> {
        let url = self.url(&Self::rest_path(table), &filter_pairs(filters))?;
        debug!("DELETE {}", url);
        let response = self.request(Method::DELETE, url).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, PlatformError> {
        let url = self.url(
            "/auth/v1/token",
            &[("grant_type".to_string(), "password".to_string())],
        )?;
        self.token_request(url, json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<AuthSession, PlatformError> {
        let url = self.url("/auth/v1/signup", &[])?;
        self.token_request(
            url,
            json!({ "email": email, "password": password, "data": { "nome": name } }),
        )
        .await
    }

    async fn user_for_token(&self, access_token: &str) -> Result<Option<Uuid>, PlatformError> {
        let url = self.url("/auth/v1/user", &[])?;
        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }
        let user: AuthUser = check(response).await?.json().await?;
        Ok(Some(user.id))
    }

    fn scoped(&self, access_token: &str) -> Arc<dyn DataPlatform> {
        Arc::new(RestPlatform {
            access_token: Some(access_token.to_string()),
            ..self.clone()
        })
    }
}
