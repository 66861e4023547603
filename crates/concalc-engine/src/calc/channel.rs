//! The boundary between the UI thread and the evaluator.
//!
//! Requests carry the whole buffer text, responses one annotated line per
//! input line. A channel can be dropped and replaced at any time with no
//! handshake; nothing on the other side keeps state between requests.

use std::thread;

use log::debug;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::calc::LineEvaluator;

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationRequest {
    pub id: RequestId,
    /// Full buffer, newline-joined
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationResponse {
    pub id: RequestId,
    /// One entry per request line, same order
    pub results: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("evaluation worker is gone")]
    Disconnected,
    #[error("failed to spawn evaluation worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// One live connection to an evaluator.
pub trait EvalChannel {
    fn send(&mut self, request: CalculationRequest) -> Result<(), ChannelError>;

    /// Next response that has already arrived, without blocking.
    fn try_recv(&mut self) -> Option<CalculationResponse>;
}

/// Creates fresh channels; used at start-up and after a timeout.
pub trait ChannelFactory {
    type Channel: EvalChannel;

    fn spawn(&mut self) -> Result<Self::Channel, ChannelError>;
}

/// Spawns one dedicated evaluator thread per channel.
#[derive(Debug, Default)]
pub struct WorkerFactory {
    evaluator: LineEvaluator,
    spawned: u64,
}

impl WorkerFactory {
    pub fn new(evaluator: LineEvaluator) -> Self {
        Self {
            evaluator,
            spawned: 0,
        }
    }
}

impl ChannelFactory for WorkerFactory {
    type Channel = WorkerChannel;

    fn spawn(&mut self) -> Result<WorkerChannel, ChannelError> {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let evaluator = self.evaluator;

        self.spawned += 1;
        // The handle is dropped: a hung worker is detached, never joined
        thread::Builder::new()
            .name(format!("concalc-eval-{}", self.spawned))
            .spawn(move || run_worker(evaluator, request_rx, response_tx))?;

        Ok(WorkerChannel {
            requests: request_tx,
            responses: response_rx,
        })
    }
}

/// UI side of a worker thread. Dropping it tells the worker to exit as soon
/// as it finishes whatever it is computing.
#[derive(Debug)]
pub struct WorkerChannel {
    requests: UnboundedSender<CalculationRequest>,
    responses: UnboundedReceiver<CalculationResponse>,
}

impl EvalChannel for WorkerChannel {
    fn send(&mut self, request: CalculationRequest) -> Result<(), ChannelError> {
        self.requests
            .send(request)
            .map_err(|_| ChannelError::Disconnected)
    }

    fn try_recv(&mut self) -> Option<CalculationResponse> {
        self.responses.try_recv().ok()
    }
}

fn run_worker(
    evaluator: LineEvaluator,
    mut requests: UnboundedReceiver<CalculationRequest>,
    responses: UnboundedSender<CalculationResponse>,
) {
    while let Some(mut request) = requests.blocking_recv() {
        // Only the newest queued request can still be accepted
        while let Ok(newer) = requests.try_recv() {
            request = newer;
        }

        let results = evaluator.evaluate_text(&request.text);
        let response = CalculationResponse {
            id: request.id,
            results,
        };
        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("evaluation worker exiting");
}
