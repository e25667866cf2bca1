//! Application entry point contract and dispatch.
//!
//! # Data Flow
//! ```text
//! NormalizedRequest
//!     → dispatch() creates a oneshot channel
//!     → Handler::handle(request, Completion)       (called exactly once)
//!     → handler resolves Completion, now or later, from any task or thread
//!     → dispatch() yields the Outcome to the response translator
//! ```
//!
//! # Design Decisions
//! - `Completion` is consumed by value, so it resolves at most once
//! - A token dropped without resolving becomes an error outcome, so the
//!   response is still written exactly once
//! - No timeout: a handler that holds its token forever hangs that request

pub mod echo;
pub mod event;
pub mod forward;

use std::future::Future;

use tokio::sync::oneshot;

pub use echo::EchoHandler;
pub use event::{HandlerError, HandlerResponse, NormalizedRequest, Outcome, RequestContext};
pub use forward::ForwardHandler;

/// Message reported when a handler drops its token without resolving it.
pub const DROPPED_COMPLETION: &str = "handler dropped its completion token without responding";

/// The single application entry point.
pub trait Handler: Send + Sync + 'static {
    /// Handle one request and eventually resolve `done`.
    fn handle(&self, request: NormalizedRequest, done: Completion);
}

/// Single-use completion token for one request.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Outcome>,
}

impl Completion {
    /// Resolve with an outcome.
    pub fn finish(self, outcome: Outcome) {
        if self.tx.send(outcome).is_err() {
            tracing::debug!("Completion resolved after the request was abandoned");
        }
    }

    /// Resolve successfully.
    pub fn succeed(self, response: HandlerResponse) {
        self.finish(Ok(response));
    }

    /// Resolve with an error.
    pub fn fail(self, error: HandlerError) {
        self.finish(Err(error));
    }

    /// Callback-style resolution.
    ///
    /// The error wins when both are supplied; neither means an empty success.
    pub fn done(self, error: Option<HandlerError>, result: Option<HandlerResponse>) {
        match error {
            Some(error) => self.fail(error),
            None => self.succeed(result.unwrap_or_default()),
        }
    }

    /// True once the waiting request has gone away (e.g. client disconnect).
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Invoke `handler` once with `request` and wait for its outcome.
pub async fn dispatch(handler: &dyn Handler, request: NormalizedRequest) -> Outcome {
    let (tx, rx) = oneshot::channel();
    handler.handle(request, Completion { tx });

    match rx.await {
        Ok(outcome) => outcome,
        Err(_) => Err(HandlerError::new(DROPPED_COMPLETION)),
    }
}

/// Adapts an async function into a [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

/// Build a [`Handler`] from `async fn(NormalizedRequest) -> Outcome`.
///
/// Each call is spawned onto the current tokio runtime.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(NormalizedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    FnHandler { f }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(NormalizedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    fn handle(&self, request: NormalizedRequest, done: Completion) {
        let fut = (self.f)(request);
        tokio::spawn(async move {
            done.finish(fut.await);
        });
    }
}
