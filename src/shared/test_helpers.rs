#[cfg(test)]
use crate::features::auth::model::UserContext;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, Router};

#[cfg(test)]
pub fn test_user_context() -> UserContext {
    UserContext {
        user_id: "user-1".to_string(),
        organization_id: Some("org-1".to_string()),
        tenant_id: Some("tenant-1".to_string()),
    }
}

/// Wrap a router with middleware that injects the given UserContext,
/// bypassing JWT validation in handler tests.
#[cfg(test)]
pub fn with_user_context(router: Router, ctx: UserContext) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let ctx = ctx.clone();
            async move {
                request.extensions_mut().insert(ctx);
                next.run(request).await
            }
        },
    ))
}
