//! Splits inbound frames into RPC replies and subscription notifications.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use serde_json::value::RawValue;
use tokio::sync::{Mutex, Notify};

use crate::error::TransportError;

/// Probe for the classification rule: a frame whose top-level object carries
/// a `params` key is a subscription notification.
#[derive(Deserialize)]
struct NotificationProbe<'a> {
    #[serde(borrow, default)]
    params: Option<&'a RawValue>,
}

/// Queues between a persistent transport's read loop and its consumers.
///
/// The read loop is the sole producer. Replies land on a LIFO stack (the
/// next reply answers the latest request; see the one-in-flight contract on
/// [`Transport`](crate::transport::Transport)), notifications on a FIFO
/// queue bounded only by memory.
#[derive(Debug, Default)]
pub(crate) struct MessageRouter {
    rpc_stack: Mutex<Vec<Box<RawValue>>>,
    rpc_ready: Notify,
    sub_queue: Mutex<VecDeque<Box<RawValue>>>,
    sub_ready: Notify,
    closed: AtomicBool,
}

impl MessageRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Classifies one parsed frame and enqueues it.
    pub(crate) async fn route(&self, frame: Box<RawValue>) {
        let is_notification = serde_json::from_str::<NotificationProbe<'_>>(frame.get())
            .map(|probe| probe.params.is_some())
            .unwrap_or(false);
        if is_notification {
            self.sub_queue.lock().await.push_back(frame);
            self.sub_ready.notify_one();
        } else {
            self.rpc_stack.lock().await.push(frame);
            self.rpc_ready.notify_one();
        }
    }

    /// Pops the reply to the latest request, waiting for the read loop.
    pub(crate) async fn pop_reply(&self) -> Result<Box<RawValue>, TransportError> {
        loop {
            if let Some(frame) = self.rpc_stack.lock().await.pop() {
                return Ok(frame);
            }
            if self.closed.load(Ordering::Acquire) {
                // Cascade the wakeup so every blocked consumer unblocks.
                self.rpc_ready.notify_one();
                return Err(TransportError::Disconnected);
            }
            self.rpc_ready.notified().await;
        }
    }

    /// Pops the oldest pending subscription notification.
    pub(crate) async fn pop_notification(&self) -> Result<Box<RawValue>, TransportError> {
        loop {
            if let Some(frame) = self.sub_queue.lock().await.pop_front() {
                return Ok(frame);
            }
            if self.closed.load(Ordering::Acquire) {
                self.sub_ready.notify_one();
                return Err(TransportError::Disconnected);
            }
            self.sub_ready.notified().await;
        }
    }

    /// Marks the connection gone and wakes all blocked consumers.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.rpc_ready.notify_one();
        self.sub_ready.notify_one();
    }
}
