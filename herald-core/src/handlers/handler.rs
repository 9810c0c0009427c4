use std::future::Future;

use rst_common::standard::async_trait::async_trait;

use crate::message::Envelope;

use super::types::{FallbackHandler, HandlerError, MessageHandler, Unhandled};

/// Adapter turning an async closure into a [`MessageHandler`]
pub struct HandlerFn<F>(F);

pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(String, Envelope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> MessageHandler for HandlerFn<F>
where
    F: Fn(String, Envelope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, message_name: &str, envelope: Envelope) -> Result<(), HandlerError> {
        (self.0)(message_name.to_string(), envelope).await
    }
}

/// Adapter turning an async closure into a [`FallbackHandler`]
pub struct FallbackFn<F>(F);

pub fn fallback_fn<F, Fut>(f: F) -> FallbackFn<F>
where
    F: Fn(Unhandled, Envelope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    FallbackFn(f)
}

#[async_trait]
impl<F, Fut> FallbackHandler for FallbackFn<F>
where
    F: Fn(Unhandled, Envelope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, reason: Unhandled, envelope: Envelope) -> Result<(), HandlerError> {
        (self.0)(reason, envelope).await
    }
}
