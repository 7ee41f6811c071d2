//! Mock mount middleware.
//! Answers from the mock tree or passes the request to the next layer.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};

use crate::dispatch::{Mount, MountOutcome, PendingResponse};

pub async fn mock_middleware(
    State(mount): State<Arc<Mount>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match mount.handle(req).await {
        Ok(MountOutcome::Respond(response)) => response,
        Ok(MountOutcome::Next(mut req)) => {
            let pending = req.extensions_mut().remove::<PendingResponse>();
            let mut response = next.run(req).await;
            if let Some(pending) = pending {
                pending.apply_to(&mut response);
            }
            response
        }
        Err(e) => e.into_response(),
    }
}

impl Mount {
    /// Layer this mount over `router`, starting its watcher if configured.
    ///
    /// Layers wrap what was added before them, so when stacking mounts the
    /// one applied last answers first.
    pub fn apply<S>(mut self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        if let Err(e) = self.watch() {
            tracing::warn!(
                dir = %self.config().target.display(),
                error = %e,
                "Failed to watch mock tree, index falls back to its TTL"
            );
        }
        router.layer(middleware::from_fn_with_state(Arc::new(self), mock_middleware))
    }
}
