//! [`SessionStore`] — the single source of truth for who is signed in.
//!
//! Lifecycle: `init -> [restore-or-absent] -> authenticated <-> anonymous`.
//! The store starts out loading; [`SessionStore::restore`] settles it. Every
//! identity change is published to `watch` subscribers and handed to the
//! registered [`IdentityObserver`]s before the operation returns.

use std::sync::{
  Arc, PoisonError, RwLock,
  atomic::{AtomicU64, Ordering},
};

use skilltrade_core::{AuthError, Identity, Password, service::IdentityService};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::LocalCache;

// ─── State ───────────────────────────────────────────────────────────────────

/// A snapshot of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
  pub identity: Option<Identity>,
  /// `true` until the startup restoration has settled.
  pub loading:  bool,
}

impl SessionState {
  pub fn is_authenticated(&self) -> bool { self.identity.is_some() }

  pub fn status(&self) -> AuthStatus {
    match (&self.identity, self.loading) {
      (Some(_), _) => AuthStatus::Authenticated,
      (None, true) => AuthStatus::Undetermined,
      (None, false) => AuthStatus::Anonymous,
    }
  }
}

/// Authentication as dependents should read it. While the session is still
/// loading the answer is [`AuthStatus::Undetermined`], never anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
  Undetermined,
  Anonymous,
  Authenticated,
}

// ─── Observers ───────────────────────────────────────────────────────────────

/// Synchronous hook run on every identity change, inside the notifying
/// operation.
pub trait IdentityObserver: Send + Sync {
  fn identity_changed(&self, identity: Option<&Identity>);

  /// Closed observers are dropped on the next notification.
  fn is_closed(&self) -> bool { false }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Holds the current [`Identity`] and mediates the identity service.
///
/// Cloning is cheap; clones share the same state.
pub struct SessionStore<I> {
  inner: Arc<Inner<I>>,
}

struct Inner<I> {
  service:   I,
  cache:     Arc<dyn LocalCache>,
  state:     watch::Sender<SessionState>,
  /// Bumped by every identity change and every logout; restorations started
  /// under an older epoch are discarded.
  epoch:     AtomicU64,
  observers: RwLock<Vec<Arc<dyn IdentityObserver>>>,
}

impl<I> Clone for SessionStore<I> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<I: IdentityService> SessionStore<I> {
  /// A store in the loading state. Call [`restore`](Self::restore) to settle
  /// it.
  pub fn new(service: I, cache: Arc<dyn LocalCache>) -> Self {
    let (state, _) = watch::channel(SessionState { identity: None, loading: true });
    Self {
      inner: Arc::new(Inner {
        service,
        cache,
        state,
        epoch: AtomicU64::new(0),
        observers: RwLock::new(Vec::new()),
      }),
    }
  }

  /// Build a store and wait for session restoration.
  pub async fn init(service: I, cache: Arc<dyn LocalCache>) -> Self {
    let store = Self::new(service, cache);
    store.restore().await;
    store
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn state(&self) -> SessionState { self.inner.state.borrow().clone() }

  pub fn identity(&self) -> Option<Identity> {
    self.inner.state.borrow().identity.clone()
  }

  pub fn is_authenticated(&self) -> bool {
    self.inner.state.borrow().is_authenticated()
  }

  pub fn status(&self) -> AuthStatus { self.inner.state.borrow().status() }

  pub fn subscribe(&self) -> watch::Receiver<SessionState> {
    self.inner.state.subscribe()
  }

  /// Resolve once the session is no longer loading.
  pub async fn settled(&self) -> SessionState {
    let mut rx = self.subscribe();
    match rx.wait_for(|s| !s.loading).await {
      Ok(state) => state.clone(),
      Err(_) => self.state(),
    }
  }

  /// Register a synchronous observer. It is immediately told about the
  /// current identity if the session has already settled.
  pub fn add_observer(&self, observer: Arc<dyn IdentityObserver>) {
    let current = self.state();
    if !current.loading {
      observer.identity_changed(current.identity.as_ref());
    }
    self
      .inner
      .observers
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .push(observer);
  }

  // ── Operations ────────────────────────────────────────────────────────────

  /// Ask the identity service for a surviving session and settle the store.
  ///
  /// Failures are logged and leave the session anonymous. If an explicit
  /// operation ran while the service was being asked, its result wins and the
  /// restored identity is discarded.
  pub async fn restore(&self) -> Option<Identity> {
    let epoch = self.inner.epoch.load(Ordering::SeqCst);

    let restored = match self.inner.service.restore_session().await {
      Ok(found) => found,
      Err(e) => {
        warn!(error = %e, "session restoration failed; continuing signed out");
        None
      }
    };

    let applied = self.inner.state.send_if_modified(|state| {
      if self.inner.epoch.load(Ordering::SeqCst) != epoch {
        return false;
      }
      *state = SessionState { identity: restored.clone(), loading: false };
      true
    });

    if !applied {
      debug!("discarding superseded session restoration");
      return self.identity();
    }

    match &restored {
      Some(identity) => info!(user_id = %identity.id, "session restored"),
      None => debug!("no session to restore"),
    }
    self.notify(restored.as_ref());
    restored
  }

  /// Create an account and sign in as it.
  ///
  /// On failure the current identity is left untouched.
  pub async fn register(
    &self,
    email: &str,
    password: &Password,
  ) -> Result<Identity, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
      return Err(AuthError::MissingCredentials);
    }

    let identity = self
      .inner
      .service
      .create_account(email, password.expose())
      .await
      .inspect_err(|e| warn!(error = %e, "registration failed"))?;

    info!(user_id = %identity.id, "account registered");
    self.publish(Some(identity.clone()));
    Ok(identity)
  }

  /// Sign in to an existing account.
  pub async fn login(
    &self,
    email: &str,
    password: &Password,
  ) -> Result<Identity, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
      return Err(AuthError::MissingCredentials);
    }

    let identity = self
      .inner
      .service
      .authenticate(email, password.expose())
      .await
      .inspect_err(|e| warn!(error = %e, "login failed"))?;

    info!(user_id = %identity.id, "signed in");
    self.publish(Some(identity.clone()));
    Ok(identity)
  }

  /// Sign out unconditionally.
  ///
  /// Clears the identity (and with it, through the observers, the profile),
  /// ends the remote session, and purges cached session artifacts. The remote
  /// session is ended even when the store already reads signed out, since a
  /// failed restoration can leave one behind.
  pub async fn logout(&self) {
    self.inner.epoch.fetch_add(1, Ordering::SeqCst);
    let prior = self.state();

    if prior.identity.is_some() || prior.loading {
      self.publish(None);
    }
    if let Err(e) = self.inner.service.end_session().await {
      warn!(error = %e, "identity service did not end the session");
    }

    if let Err(e) = self.inner.cache.purge_session() {
      warn!(error = %e, "failed to purge cached session artifacts");
    }

    if let Some(identity) = prior.identity {
      info!(user_id = %identity.id, "signed out");
    }
  }

  // ── Notification ──────────────────────────────────────────────────────────

  /// Replace the identity and supersede any pending restoration. Failed
  /// operations never get here.
  fn publish(&self, identity: Option<Identity>) {
    self.inner.state.send_modify(|state| {
      self.inner.epoch.fetch_add(1, Ordering::SeqCst);
      *state = SessionState { identity: identity.clone(), loading: false };
    });
    self.notify(identity.as_ref());
  }

  fn notify(&self, identity: Option<&Identity>) {
    // Snapshot first so observers may call back into the store.
    let observers: Vec<_> = {
      let mut guard = self
        .inner
        .observers
        .write()
        .unwrap_or_else(PoisonError::into_inner);
      guard.retain(|o| !o.is_closed());
      guard.clone()
    };
    for observer in observers {
      observer.identity_changed(identity);
    }
  }
}
