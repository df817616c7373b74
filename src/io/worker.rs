use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::io::gateway::{GatewayError, TaskGateway};
use crate::model::task::{Task, TaskId, TaskPayload};

/// Identifies one submitted request
pub type Ticket = u64;

/// A request to run against the gateway off the UI thread
#[derive(Debug, Clone)]
pub enum GatewayRequest {
    List,
    Create(TaskPayload),
    Update(TaskId, TaskPayload),
    Delete(TaskId),
}

/// What the gateway answered
#[derive(Debug)]
pub enum GatewayResponse {
    Listed(Result<Vec<Task>, GatewayError>),
    Saved(Result<Option<Task>, GatewayError>),
    Deleted(Result<(), GatewayError>),
}

/// A finished request, sent from the worker thread to the event loop.
#[derive(Debug)]
pub struct GatewayReply {
    pub ticket: Ticket,
    pub response: GatewayResponse,
}

/// Runs gateway requests on background threads. Requests are independent:
/// several may be outstanding at once and replies arrive in completion order.
pub struct GatewayWorker {
    gateway: Arc<dyn TaskGateway>,
    tx: mpsc::Sender<GatewayReply>,
    rx: mpsc::Receiver<GatewayReply>,
    next_ticket: Ticket,
}

impl GatewayWorker {
    pub fn new(gateway: Arc<dyn TaskGateway>) -> Self {
        let (tx, rx) = mpsc::channel();
        GatewayWorker {
            gateway,
            tx,
            rx,
            next_ticket: 1,
        }
    }

    /// Start a request and return its ticket immediately.
    pub fn submit(&mut self, request: GatewayRequest) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tracing::debug!(ticket, ?request, "request submitted");
        thread::spawn(move || {
            let response = match request {
                GatewayRequest::List => GatewayResponse::Listed(gateway.list()),
                GatewayRequest::Create(payload) => {
                    GatewayResponse::Saved(gateway.create(&payload))
                }
                GatewayRequest::Update(id, payload) => {
                    GatewayResponse::Saved(gateway.update(id, &payload))
                }
                GatewayRequest::Delete(id) => GatewayResponse::Deleted(gateway.delete(id)),
            };
            // The receiver is gone only when the UI has exited
            let _ = tx.send(GatewayReply { ticket, response });
        });
        ticket
    }

    /// Non-blocking poll for finished requests.
    /// Returns all queued replies (may be empty).
    pub fn poll(&self) -> Vec<GatewayReply> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.rx.try_recv() {
            replies.push(reply);
        }
        replies
    }

    /// Block until the next reply arrives or `timeout` passes.
    pub fn wait(&self, timeout: Duration) -> Option<GatewayReply> {
        self.rx.recv_timeout(timeout).ok()
    }
}
