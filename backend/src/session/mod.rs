//! Session bootstrap.
//!
//! Every request resolves its bearer token into a session through a small
//! state machine:
//!
//! ```text
//! Init -> Loading(user) -> Ready(profile)
//!                       -> Degraded(user, consulta)   profile lookup timed out or failed
//!                       -> SignedOut                   profile disabled
//! Init -> SignedOut                                    unknown or expired token
//! ```
//!
//! A slow profile lookup never blocks the request: after the configured
//! timeout the caller continues with the read-only role.

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use common::model::profile::{Profile, Role};
use common::requests::SessionInfo;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::platform::DataPlatform;
use crate::store::{Actor, RecordStore};

/// Role granted while the profile is unknown.
pub const DEGRADED_ROLE: Role = Role::ReadOnly;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Init,
    Loading { user_id: Uuid },
    Ready { profile: Profile },
    Degraded { user_id: Uuid, role: Role },
    SignedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TokenResolved(Option<Uuid>),
    ProfileLoaded(Option<Profile>),
    ProfileUnavailable,
}

impl SessionState {
    pub fn step(self, event: SessionEvent) -> SessionState {
        match (self, event) {
            (SessionState::Init, SessionEvent::TokenResolved(Some(user_id))) => SessionState::Loading { user_id },
            (SessionState::Init, SessionEvent::TokenResolved(None)) => SessionState::SignedOut,
            (SessionState::Loading { .. }, SessionEvent::ProfileLoaded(Some(profile))) if !profile.active => {
                SessionState::SignedOut
            }
            (SessionState::Loading { .. }, SessionEvent::ProfileLoaded(Some(profile))) => {
                SessionState::Ready { profile }
            }
            (SessionState::Loading { user_id }, SessionEvent::ProfileLoaded(None) | SessionEvent::ProfileUnavailable) => {
                SessionState::Degraded {
                    user_id,
                    role: DEGRADED_ROLE,
                }
            }
            (state, _) => state,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SessionState::Ready { .. } | SessionState::Degraded { .. } | SessionState::SignedOut
        )
    }
}

/// Runs the state machine for `token` against `platform`, which must already
/// be scoped to that token.
pub async fn bootstrap(platform: Arc<dyn DataPlatform>, token: &str, timeout: Duration) -> Result<SessionState, AppError> {
    let user = platform.user_for_token(token).await?;
    let state = SessionState::Init.step(SessionEvent::TokenResolved(user));
    let SessionState::Loading { user_id } = state else {
        return Ok(state);
    };

    let store = RecordStore::new(platform);
    let event = match tokio::time::timeout(timeout, store.profile(user_id)).await {
        Ok(Ok(profile)) => SessionEvent::ProfileLoaded(profile),
        Ok(Err(e)) => {
            warn!("profile lookup for {} failed, continuing read-only: {}", user_id, e);
            SessionEvent::ProfileUnavailable
        }
        Err(_) => {
            warn!("profile lookup for {} timed out after {:?}, continuing read-only", user_id, timeout);
            SessionEvent::ProfileUnavailable
        }
    };
    Ok(state.step(event))
}

/// An authenticated caller together with a store acting on its behalf.
pub struct Session {
    pub actor: Actor,
    pub store: RecordStore,
    pub info: SessionInfo,
}

impl Session {
    /// Resolves the bearer token of `req`. Signed-out callers get
    /// [`AppError::Unauthenticated`].
    pub async fn resolve(req: &HttpRequest, state: &AppState) -> Result<Session, AppError> {
        let token = bearer_token(req).ok_or_else(AppError::session_required)?;
        let ip = req.connection_info().realip_remote_addr().map(str::to_string);
        let platform = state.platform.scoped(&token);

        let info = match bootstrap(platform.clone(), &token, state.config.profile_timeout).await? {
            SessionState::Ready { profile } => SessionInfo::Ready {
                user_id: profile.id,
                role: profile.role,
                name: profile.name.or(profile.email).unwrap_or_default(),
            },
            SessionState::Degraded { user_id, role } => SessionInfo::Degraded { user_id, role },
            other => {
                debug!("request without a usable session: {:?}", other);
                return Err(AppError::session_required());
            }
        };
        Ok(Session {
            actor: Actor {
                user_id: info.user_id(),
                role: info.role(),
                ip,
            },
            store: RecordStore::new(platform),
            info,
        })
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
