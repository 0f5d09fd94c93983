//! Client for the backend JSON API.
//!
//! Every call attaches the access token kept in `localStorage` and turns
//! non-2xx answers into an [`ApiError`] carrying the server's message, so
//! screens only ever deal with one error type.

use common::requests::ErrorBody;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use web_sys::FormData;

const TOKEN_KEY: &str = "gestao.access_token";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status, `0` when the request never got an answer.
    pub status: u16,
    pub message: String,
}

impl ApiError {
    fn network(err: gloo_net::Error) -> Self {
        gloo_console::error!(format!("request failed: {}", err));
        ApiError {
            status: 0,
            message: "Falha de comunicação com o servidor".to_string(),
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.status == 401
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

pub fn token() -> Option<String> {
    storage()?.get_item(TOKEN_KEY).ok()?
}

pub fn store_token(token: &str) {
    if let Some(storage) = storage() {
        storage.set_item(TOKEN_KEY, token).ok();
    }
}

pub fn clear_token() {
    if let Some(storage) = storage() {
        storage.remove_item(TOKEN_KEY).ok();
    }
}

fn authorized(builder: RequestBuilder) -> RequestBuilder {
    match token() {
        Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
        None => builder,
    }
}

async fn error_from(response: Response) -> ApiError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("Erro {} no servidor", status),
    };
    gloo_console::warn!(format!("{} -> {}: {}", response.url(), status, message));
    ApiError { status, message }
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if !response.ok() {
        return Err(error_from(response).await);
    }
    response.json::<T>().await.map_err(ApiError::network)
}

async fn expect_ok(response: Response) -> Result<(), ApiError> {
    if response.ok() {
        Ok(())
    } else {
        Err(error_from(response).await)
    }
}

async fn send_json<B, T>(builder: RequestBuilder, body: &B) -> Result<T, ApiError>
where
    B: Serialize,
    T: DeserializeOwned,
{
    let request = authorized(builder).json(body).map_err(ApiError::network)?;
    let response = request.send().await.map_err(ApiError::network)?;
    read(response).await
}

pub async fn get<T: DeserializeOwned>(path: &str) -> Result<T, ApiError> {
    let response = authorized(Request::get(path))
        .send()
        .await
        .map_err(ApiError::network)?;
    read(response).await
}

pub async fn post<B: Serialize, T: DeserializeOwned>(path: &str, body: &B) -> Result<T, ApiError> {
    send_json(Request::post(path), body).await
}

pub async fn put<B: Serialize, T: DeserializeOwned>(path: &str, body: &B) -> Result<T, ApiError> {
    send_json(Request::put(path), body).await
}

pub async fn delete(path: &str) -> Result<(), ApiError> {
    let response = authorized(Request::delete(path))
        .send()
        .await
        .map_err(ApiError::network)?;
    expect_ok(response).await
}

/// Multipart upload; the browser sets the boundary header itself.
pub async fn post_form<T: DeserializeOwned>(path: &str, form: FormData) -> Result<T, ApiError> {
    let request = authorized(Request::post(path))
        .body(form)
        .map_err(ApiError::network)?;
    let response = request.send().await.map_err(ApiError::network)?;
    read(response).await
}

/// POSTs JSON and returns the raw answer, for file downloads. Bytes are kept
/// as sent so a leading BOM survives.
pub async fn post_for_bytes<B: Serialize>(path: &str, body: &B) -> Result<Vec<u8>, ApiError> {
    let request = authorized(Request::post(path))
        .json(body)
        .map_err(ApiError::network)?;
    let response = request.send().await.map_err(ApiError::network)?;
    if !response.ok() {
        return Err(error_from(response).await);
    }
    response.binary().await.map_err(ApiError::network)
}
