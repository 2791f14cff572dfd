//! Target actions
//!
//! An action is the work a target performs once its dependencies are done.
//! The engine only awaits it; how it does its work is up to the action.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::namespace::Namespace;

/// Per-invocation information handed to an action
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// The namespace the target was resolved from
    pub namespace: Namespace,
    /// Matched name fragments. Exact and glob targets get the matched name at
    /// index 0; regex targets get the whole match followed by each group.
    pub matched: Vec<String>,
}

/// Work performed by a target
#[async_trait]
pub trait Action: Send + Sync + fmt::Debug {
    /// Run the action with the target's positional arguments
    async fn execute(&self, ctx: &ActionContext, args: &[String]) -> anyhow::Result<()>;
}

/// An action backed by an async closure
pub struct FnAction<F> {
    func: F,
}

impl<F> fmt::Debug for FnAction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Action for FnAction<F>
where
    F: Fn(ActionContext, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn execute(&self, ctx: &ActionContext, args: &[String]) -> anyhow::Result<()> {
        (self.func)(ctx.clone(), args.to_vec()).await
    }
}

/// Wrap an async closure into a shareable action
pub fn action<F, Fut>(func: F) -> Arc<dyn Action>
where
    F: Fn(ActionContext, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnAction { func })
}
