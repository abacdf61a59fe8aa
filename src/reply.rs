//! Reply-generating collaborators
//!
//! The conversation never talks to a backend directly. It hands the trimmed
//! user text to a [`ReplyGenerator`] and waits for either a displayable
//! payload or a failure. [`ScriptedReply`] stands in for a real assistant:
//! it waits a fixed delay and then answers with the configured offers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ReplyError;
use crate::state::{Content, OfferList};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// Anything that can answer a user message, asynchronously and fallibly
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Content, ReplyError>;
}

/// When the scripted backend pretends to fail
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FailureMode {
    #[default]
    Never,
    Always,
    /// Fail with the given probability in `0.0..=1.0`
    Rate(f64),
}

impl FailureMode {
    /// Non-finite rates never fail
    pub fn from_rate(rate: f64) -> Self {
        if !rate.is_finite() || rate <= 0.0 {
            FailureMode::Never
        } else if rate >= 1.0 {
            FailureMode::Always
        } else {
            FailureMode::Rate(rate)
        }
    }

    fn should_fail(self) -> bool {
        match self {
            FailureMode::Never => false,
            FailureMode::Always => true,
            FailureMode::Rate(p) if p.is_finite() => {
                rand::thread_rng().gen_bool(p.clamp(0.0, 1.0))
            }
            FailureMode::Rate(_) => false,
        }
    }
}

/// Fixed-reply stand-in for an assistant backend
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    delay: Duration,
    offers: OfferList,
    failure: FailureMode,
}

impl ScriptedReply {
    pub fn new(offers: OfferList) -> Self {
        Self {
            delay: DEFAULT_DELAY,
            offers,
            failure: FailureMode::Never,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_failure(mut self, failure: FailureMode) -> Self {
        self.failure = failure;
        self
    }
}

impl Default for ScriptedReply {
    fn default() -> Self {
        Self::new(OfferList::builtin())
    }
}

#[async_trait]
impl ReplyGenerator for ScriptedReply {
    async fn generate(&self, prompt: &str) -> Result<Content, ReplyError> {
        debug!(prompt_len = prompt.len(), delay_ms = self.delay.as_millis() as u64, "scripted reply");
        tokio::time::sleep(self.delay).await;

        if self.failure.should_fail() {
            return Err(ReplyError::failed("simulated backend error"));
        }
        Ok(Content::Offers(self.offers.clone()))
    }
}

/// A reply running on its own tokio task.
///
/// Awaiting it never panics: a generator that panics, before or after its
/// first await, resolves to [`ReplyError::Panicked`].
pub struct ReplyTask {
    handle: JoinHandle<Result<Content, ReplyError>>,
}

impl ReplyTask {
    pub fn spawn(generator: Arc<dyn ReplyGenerator>, prompt: String) -> Self {
        let handle = tokio::spawn(async move { generator.generate(&prompt).await });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for ReplyTask {
    type Output = Result<Content, ReplyError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                warn!("reply generator panicked");
                Err(ReplyError::Panicked)
            }
            Err(e) => Err(ReplyError::failed(e.to_string())),
        })
    }
}

/// Run a generator to completion and collect its outcome
pub async fn run_reply(generator: Arc<dyn ReplyGenerator>, prompt: String) -> Result<Content, ReplyError> {
    ReplyTask::spawn(generator, prompt).await
}
