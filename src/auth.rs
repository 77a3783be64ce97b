use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Contract with the authentication provider. The daemon only ever asks two
/// things of it; sign-in prompting stays in the UI shell.
#[async_trait(?Send)]
pub trait AuthGate {
    /// One awaited session check. Any failure mode answers "no" — protected
    /// content is never opened on an error path.
    async fn is_authenticated(&self) -> bool;

    /// Best-effort provider sign-out.
    async fn sign_out(&self);
}

/// Session check against the provider's server-side session endpoint. The
/// endpoint returns `{ "authenticated": bool }` for the caller's session.
/// The whole check runs under one explicit timeout instead of a bounded
/// client-availability poll.
pub struct HttpAuthGate {
    client: reqwest::Client,
    session_endpoint: Option<String>,
    sign_out_endpoint: Option<String>,
    timeout: Duration,
}

impl HttpAuthGate {
    pub fn new(
        client: reqwest::Client,
        session_endpoint: Option<String>,
        sign_out_endpoint: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            session_endpoint,
            sign_out_endpoint,
            timeout,
        }
    }

    async fn check_session(&self, endpoint: &str) -> Result<bool, reqwest::Error> {
        let resp = self.client.get(endpoint).send().await?.error_for_status()?;
        let body: serde_json::Value = resp.json().await?;
        Ok(body
            .get("authenticated")
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

#[async_trait(?Send)]
impl AuthGate for HttpAuthGate {
    async fn is_authenticated(&self) -> bool {
        let Some(endpoint) = self.session_endpoint.as_deref() else {
            // No provider configured: fail closed.
            return false;
        };
        match tokio::time::timeout(self.timeout, self.check_session(endpoint)).await {
            Ok(Ok(authenticated)) => authenticated,
            Ok(Err(e)) => {
                warn!("auth session check failed, treating as signed out: {e}");
                false
            }
            Err(_) => {
                warn!(
                    "auth session check timed out after {}ms, treating as signed out",
                    self.timeout.as_millis()
                );
                false
            }
        }
    }

    async fn sign_out(&self) {
        let Some(endpoint) = self.sign_out_endpoint.as_deref() else {
            return;
        };
        let req = self.client.post(endpoint).send();
        match tokio::time::timeout(self.timeout, req).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("provider sign-out call failed: {e}"),
            Err(_) => warn!("provider sign-out call timed out"),
        }
    }
}
