//! # Lifecycle hooks.
//!
//! `before` hooks run after collection and may rewrite the context (headers,
//! url, collected pairs) prior to the request. `after` hooks run once the
//! pipeline has otherwise resolved. Hooks are resolved by name against the
//! hook registry; an unknown name is skipped with a warning, never a failure.

use async_trait::async_trait;

use crate::model::Context;

/// One named lifecycle hook.
#[async_trait]
pub trait Hook: Send + Sync + 'static {
    async fn call(&self, cx: &mut Context);
}

/// Adapter for plain synchronous functions.
pub struct HookFn<F>(pub F);

#[async_trait]
impl<F> Hook for HookFn<F>
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    async fn call(&self, cx: &mut Context) {
        (self.0)(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_fn_adapter_mutates_context() {
        let hook = HookFn(|cx: &mut Context| {
            cx.config
                .headers
                .insert("x-audit".to_string(), "1".to_string());
        });
        let mut cx = Context::new(None, Config::default(), "api");
        hook.call(&mut cx).await;
        assert_eq!(cx.config.headers.get("x-audit").map(String::as_str), Some("1"));
    }
}
