use super::{Gateway, RequestSink, TranslationReply, TranslationRequest};
use crate::logger;
use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Called after every delivered reply, from a runtime worker thread.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Runs gateway calls off the UI thread and hands the replies back over a
/// channel the UI thread drains.
///
/// Calls from different sessions run concurrently and share nothing. A call
/// is never cancelled; stale replies are the receiver's business.
pub struct Dispatcher {
    runtime: tokio::runtime::Runtime,
    gateway: Arc<dyn Gateway>,
    replies: Sender<TranslationReply>,
    waker: Arc<OnceCell<Waker>>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn Gateway>) -> Result<(Self, Receiver<TranslationReply>)> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("noctis-gateway")
            .enable_all()
            .build()?;
        let (replies, rx) = crossbeam_channel::unbounded();
        logger::info(&format!("Dispatcher ready ({})", gateway.provider_name()));
        Ok((Self { runtime, gateway, replies, waker: Arc::new(OnceCell::new()) }, rx))
    }

    /// Installs the waker. Only the first call has an effect.
    pub fn set_waker(&self, waker: Waker) {
        let _ = self.waker.set(waker);
    }

    pub fn provider_name(&self) -> &str {
        self.gateway.provider_name()
    }
}

impl RequestSink for Dispatcher {
    fn submit(&self, request: TranslationRequest) {
        let gateway = Arc::clone(&self.gateway);
        let replies = self.replies.clone();
        let waker = Arc::clone(&self.waker);
        self.runtime.spawn(async move {
            let outcome = gateway.translate(&request.text, &request.from, &request.to).await;
            if let Err(e) = &outcome {
                logger::warn(&format!("{} failed for session {}: {}", gateway.provider_name(), request.session, e));
            }
            if replies.send(TranslationReply::to(&request, outcome)).is_err() {
                // receiver gone: the UI has shut down
                return;
            }
            if let Some(wake) = waker.get() {
                wake();
            }
        });
    }
}
