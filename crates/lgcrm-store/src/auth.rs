// ABOUTME: Demo session emulation: any non-empty identifier signs in as the demo user.
// ABOUTME: The session lives beside the store under the engine lock and is mirrored to the medium.

use lgcrm_core::{Session, now};
use thiserror::Error;

use crate::change::Change;
use crate::engine::Engine;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("an identifier is required to sign in")]
    MissingIdentifier,
}

/// Session operations bound to one engine.
#[derive(Clone)]
pub struct Auth {
    engine: Engine,
}

impl Auth {
    pub(crate) fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Sign in as the demo user. The secret is accepted and ignored.
    ///
    /// A blank identifier fails and leaves any current session in place.
    pub async fn sign_in(&self, identifier: &str, _secret: &str) -> Result<Session, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AuthError::MissingIdentifier);
        }

        let session = Session::demo(identifier, now());
        let mut state = self.engine.write().await;
        state.session = Some(session.clone());
        self.engine.persist_session(Some(&session));
        tracing::info!(user = %session.user_id, identifier, "signed in");
        self.engine.publish(Change::SessionChanged { signed_in: true });
        Ok(session)
    }

    /// The current session, if signed in.
    pub async fn get_session(&self) -> Option<Session> {
        self.engine.read().await.session.clone()
    }

    /// Clear the session. Signing out while signed out is a no-op.
    pub async fn sign_out(&self) {
        let mut state = self.engine.write().await;
        if state.session.take().is_none() {
            tracing::debug!("sign out without a session");
            return;
        }
        self.engine.persist_session(None);
        tracing::info!("signed out");
        self.engine.publish(Change::SessionChanged { signed_in: false });
    }
}
