// ── Token manager ──
//
// Owns the single cached bearer credential. Refresh is proactive: a new
// token is requested once `refresh_at` passes, never in reaction to a
// failed request (except after an explicit `invalidate`).

use rapt_api::Credential;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::source::Authenticator;

#[derive(Debug, Default)]
pub struct TokenManager {
    credential: Option<Credential>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a credential that is valid right now.
    ///
    /// Authenticates when nothing is cached or the cached token is past
    /// its refresh point. If a refresh fails transiently while the old
    /// token has not yet expired, the old token is returned and the
    /// refresh is retried on the next call.
    pub async fn get_valid_credential<A: Authenticator>(
        &mut self,
        auth: &A,
    ) -> Result<Credential, CoreError> {
        let now = Instant::now();
        if let Some(cred) = &self.credential {
            if !cred.needs_refresh(now) {
                return Ok(cred.clone());
            }
            debug!("cached token reached its refresh point");
        }

        match auth.authenticate().await {
            Ok(cred) => {
                if cred.is_expired(Instant::now()) {
                    return Err(CoreError::TransientAuth {
                        message: "token endpoint issued an already-expired token".into(),
                    });
                }
                info!("bearer token refreshed");
                self.credential = Some(cred.clone());
                Ok(cred)
            }
            Err(err) => {
                let err = CoreError::from_auth(err);
                if matches!(err, CoreError::AuthenticationFailed { .. }) {
                    self.credential = None;
                    return Err(err);
                }
                match &self.credential {
                    Some(cred) if !cred.is_expired(Instant::now()) => {
                        warn!(error = %err, "token refresh failed, reusing unexpired token");
                        Ok(cred.clone())
                    }
                    _ => Err(err),
                }
            }
        }
    }

    /// Drop the cached credential so the next call re-authenticates.
    pub fn invalidate(&mut self) {
        if self.credential.take().is_some() {
            debug!("cached token invalidated");
        }
    }

    pub fn current(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}
