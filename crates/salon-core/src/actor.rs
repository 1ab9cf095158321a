//! The authenticated actor used to stamp ownership on new records.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// The currently authenticated user or session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id: String,
}

/// Source of the current actor. Lookup failures are reported as `None`.
pub trait ActorProvider: Send + Sync {
  fn current_actor(&self) -> impl Future<Output = Option<Actor>> + Send + '_;
}

/// No one is signed in; inserts are never stamped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl ActorProvider for Anonymous {
  async fn current_actor(&self) -> Option<Actor> { None }
}

/// A fixed actor, e.g. one configured for a service account.
#[derive(Debug, Clone)]
pub struct StaticActor(pub Option<Actor>);

impl StaticActor {
  pub fn new(id: impl Into<String>) -> Self { Self(Some(Actor { id: id.into() })) }
}

impl ActorProvider for StaticActor {
  async fn current_actor(&self) -> Option<Actor> { self.0.clone() }
}
