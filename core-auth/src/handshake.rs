//! OAuth Handshake Coordinator
//!
//! Drives one sign-in attempt at a time through
//! `Idle -> AwaitingCallback -> Exchanging -> Idle`.
//!
//! - [`OAuthHandshake::authenticate`] opens the authorization page and
//!   returns an [`AuthOutcome`] that resolves exactly once.
//! - The host forwards redirect URIs to
//!   [`OAuthHandshake::handle_oauth_callback`].
//! - [`OAuthHandshake::sign_out`] cancels whatever is pending and forgets
//!   the token.
//!
//! All state transitions happen under one async mutex. The code exchange
//! runs in its own task with the mutex released, so it finishes even if the
//! caller of `handle_oauth_callback` is dropped. Its result is applied only
//! if the same attempt is still exchanging; a sign-out or a new attempt in
//! the meantime wins.

use crate::error::{AuthError, Result};
use crate::oauth::OAuthFlow;
use crate::token_store::TokenStore;
use crate::types::AccessToken;
use bridge_traits::launcher::UrlLauncher;
use core_runtime::events::{AuthEvent, EventBus};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, instrument, warn, Instrument};

type Outcome = std::result::Result<(), AuthError>;

/// Resolves when the sign-in attempt it belongs to finishes.
///
/// Every caller joined to the same attempt observes the same outcome.
/// Dropping it does not cancel the attempt.
#[derive(Clone)]
#[must_use = "the outcome only reports completion when awaited"]
pub struct AuthOutcome {
    inner: Shared<BoxFuture<'static, Outcome>>,
}

impl AuthOutcome {
    fn new(receiver: oneshot::Receiver<Outcome>) -> Self {
        // A dropped sender means the handshake went away mid-attempt
        let inner = receiver
            .map(|received| received.unwrap_or(Err(AuthError::Cancelled)))
            .boxed()
            .shared();
        Self { inner }
    }
}

impl Future for AuthOutcome {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

impl std::fmt::Debug for AuthOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthOutcome")
            .field("resolved", &self.inner.peek().is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingCallback,
    Exchanging,
}

/// Observable handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    AwaitingCallback,
    Exchanging,
}

struct PendingAuthentication {
    attempt: u64,
    state: String,
    auth_url: String,
    phase: Phase,
    resolver: Option<oneshot::Sender<Outcome>>,
    outcome: AuthOutcome,
}

impl PendingAuthentication {
    fn resolve(mut self, outcome: Outcome) {
        if let Some(resolver) = self.resolver.take() {
            // All receivers may be gone
            let _ = resolver.send(outcome);
        }
    }
}

/// State shared with the task running a code exchange.
struct HandshakeShared {
    token_store: Arc<TokenStore>,
    event_bus: EventBus,
    pending: Mutex<Option<PendingAuthentication>>,
}

impl HandshakeShared {
    /// Apply the result of `attempt`'s code exchange, unless that attempt
    /// already ended.
    async fn complete(&self, attempt: u64, result: Result<AccessToken>) {
        let mut pending = self.pending.lock().await;
        if pending.as_ref().map(|p| p.attempt) != Some(attempt) {
            debug!(attempt, "Sign-in attempt ended during code exchange, discarding result");
            return;
        }
        let Some(finished) = pending.take() else {
            return;
        };

        match result {
            Ok(token) => {
                // Saved under the lock so sign-out is ordered against it
                self.token_store.save(token).await;
                info!(attempt, "Signed in to Crowdin");
                let _ = self.event_bus.emit(AuthEvent::SignedIn);
                finished.resolve(Ok(()));
            }
            Err(error) => {
                self.emit_failure(&error);
                finished.resolve(Err(error));
            }
        }
    }

    fn cancel_locked(pending: &mut Option<PendingAuthentication>) {
        if let Some(current) = pending.take() {
            info!(attempt = current.attempt, "Cancelling pending sign-in");
            current.resolve(Err(AuthError::Cancelled));
        }
    }

    fn fail_pending(&self, pending: &mut Option<PendingAuthentication>, error: AuthError) {
        if let Some(current) = pending.take() {
            warn!(attempt = current.attempt, error = %error, "Sign-in failed");
            self.emit_failure(&error);
            current.resolve(Err(error));
        }
    }

    fn emit_failure(&self, error: &AuthError) {
        let _ = self.event_bus.emit(AuthEvent::AuthError {
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
    }
}

/// Single-flight OAuth sign-in.
pub struct OAuthHandshake {
    flow: OAuthFlow,
    launcher: Arc<dyn UrlLauncher>,
    shared: Arc<HandshakeShared>,
    next_attempt: AtomicU64,
}

impl OAuthHandshake {
    pub fn new(
        flow: OAuthFlow,
        launcher: Arc<dyn UrlLauncher>,
        token_store: Arc<TokenStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            flow,
            launcher,
            shared: Arc::new(HandshakeShared {
                token_store,
                event_bus,
                pending: Mutex::new(None),
            }),
            next_attempt: AtomicU64::new(1),
        }
    }

    pub async fn state(&self) -> HandshakeState {
        match self.shared.pending.lock().await.as_ref().map(|p| p.phase) {
            None => HandshakeState::Idle,
            Some(Phase::AwaitingCallback) => HandshakeState::AwaitingCallback,
            Some(Phase::Exchanging) => HandshakeState::Exchanging,
        }
    }

    /// Start a sign-in, or join the one already in progress.
    ///
    /// A new attempt opens the authorization page through the
    /// [`UrlLauncher`]. If an attempt is still waiting for its callback, the
    /// same page (same state) is opened again and the existing outcome is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidConfig`] if the authorization URL cannot be built
    /// - [`AuthError::LaunchFailed`] if the browser could not be opened; the
    ///   handshake stays idle
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<AuthOutcome> {
        let mut pending = self.shared.pending.lock().await;

        if let Some(current) = pending.as_ref() {
            debug!(
                attempt = current.attempt,
                phase = ?current.phase,
                "Sign-in already in progress, joining it"
            );
            if current.phase == Phase::AwaitingCallback {
                if let Err(e) = self.launcher.open_url(&current.auth_url).await {
                    warn!(error = %e, "Could not reopen authorization page");
                }
            }
            return Ok(current.outcome.clone());
        }

        let state = OAuthFlow::generate_state();
        let auth_url = self.flow.build_auth_url(&state)?;
        let attempt = self.next_attempt.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = self.launcher.open_url(&auth_url).await {
            warn!(attempt, error = %e, "Could not open authorization page");
            let error = AuthError::LaunchFailed(e.to_string());
            self.shared.emit_failure(&error);
            return Err(error);
        }

        let (resolver, receiver) = oneshot::channel();
        let outcome = AuthOutcome::new(receiver);

        *pending = Some(PendingAuthentication {
            attempt,
            state,
            auth_url,
            phase: Phase::AwaitingCallback,
            resolver: Some(resolver),
            outcome: outcome.clone(),
        });

        info!(attempt, "Waiting for Crowdin authorization callback");
        let _ = self.shared.event_bus.emit(AuthEvent::SigningIn);

        Ok(outcome)
    }

    /// Whether `uri` is addressed to the configured redirect URI.
    pub fn is_oauth_callback(&self, uri: &str) -> bool {
        self.flow.is_callback(uri)
    }

    /// Feed a redirect URI received by the host.
    ///
    /// Returns `true` when the URI was consumed by the pending attempt
    /// (successfully or not) and `false` when it was ignored: not a callback,
    /// no attempt waiting, or the attempt is already exchanging its code.
    ///
    /// The code exchange is spawned on the current Tokio runtime. Dropping
    /// the returned future does not stop it; the attempt still resolves.
    #[instrument(skip(self, uri))]
    pub async fn handle_oauth_callback(&self, uri: &str) -> bool {
        if !self.flow.is_callback(uri) {
            debug!("Ignoring URI that is not an OAuth callback");
            return false;
        }

        let (attempt, code) = {
            let mut pending = self.shared.pending.lock().await;

            let Some(current) = pending.as_mut() else {
                debug!("Ignoring OAuth callback, no sign-in pending");
                return false;
            };
            if current.phase == Phase::Exchanging {
                debug!(
                    attempt = current.attempt,
                    "Ignoring OAuth callback, code exchange already running"
                );
                return false;
            }

            let params = match self.flow.parse_callback(uri) {
                Ok(params) => params,
                Err(error) => {
                    self.shared.fail_pending(&mut pending, error);
                    return true;
                }
            };

            if params.state.as_deref() != Some(current.state.as_str()) {
                warn!(attempt = current.attempt, "OAuth callback state mismatch");
                self.shared.fail_pending(
                    &mut pending,
                    AuthError::AuthenticationRejected("state mismatch".to_string()),
                );
                return true;
            }

            if let Some(error) = params.error {
                let reason = params.error_description.unwrap_or(error);
                self.shared
                    .fail_pending(&mut pending, AuthError::AuthenticationRejected(reason));
                return true;
            }

            let Some(code) = params.code.filter(|c| !c.is_empty()) else {
                self.shared.fail_pending(
                    &mut pending,
                    AuthError::AuthenticationRejected("missing authorization code".to_string()),
                );
                return true;
            };

            current.phase = Phase::Exchanging;
            (current.attempt, code)
        };

        let flow = self.flow.clone();
        let shared = self.shared.clone();
        let task = async move {
            let result = match AssertUnwindSafe(flow.exchange_code(&code))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(_) => Err(AuthError::AuthenticationRejected(
                    "token exchange failed unexpectedly".to_string(),
                )),
            };
            shared.complete(attempt, result).await;
        };
        let exchange = tokio::spawn(task.in_current_span());

        if let Err(e) = exchange.await {
            warn!(attempt, error = %e, "Code exchange task did not finish");
            let mut pending = self.shared.pending.lock().await;
            if pending.as_ref().map(|p| p.attempt) == Some(attempt) {
                self.shared.fail_pending(
                    &mut pending,
                    AuthError::AuthenticationRejected(
                        "token exchange failed unexpectedly".to_string(),
                    ),
                );
            }
        }

        true
    }

    /// Resolve any pending attempt with [`AuthError::Cancelled`].
    pub async fn cancel(&self) {
        let mut pending = self.shared.pending.lock().await;
        HandshakeShared::cancel_locked(&mut pending);
    }

    /// Cancel any pending attempt and forget the token, as one step.
    pub async fn sign_out(&self) {
        let mut pending = self.shared.pending.lock().await;
        HandshakeShared::cancel_locked(&mut pending);
        self.shared.token_store.clear().await;
    }
}

impl Drop for OAuthHandshake {
    fn drop(&mut self) {
        // A running exchange task holds the lock only while applying its result
        if let Ok(mut pending) = self.shared.pending.try_lock() {
            HandshakeShared::cancel_locked(&mut pending);
        }
    }
}

impl std::fmt::Debug for OAuthHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthHandshake")
            .field("flow", &self.flow)
            .finish_non_exhaustive()
    }
}
