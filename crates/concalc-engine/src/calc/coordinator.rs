use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::calc::channel::{
    CalculationRequest, ChannelError, ChannelFactory, EvalChannel, RequestId,
};

pub const DEFAULT_CALCULATION_TIMEOUT: Duration = Duration::from_millis(1000);

/// What a [`Coordinator::poll`] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// Nothing to apply yet
    Idle,
    /// The response to the newest request
    Ready(Vec<String>),
    /// The newest request ran out of time and the channel was recreated
    TimedOut,
}

/// Dispatches whole-buffer requests and accepts only the newest response.
///
/// There is no cancel message: an older request is void because its id no
/// longer matches, and a wedged evaluator is dropped and replaced once the
/// deadline passes. Time is passed in explicitly so the event loop (and
/// tests) own the clock.
pub struct Coordinator<F: ChannelFactory> {
    factory: F,
    channel: Option<F::Channel>,
    current_id: RequestId,
    deadline: Option<Instant>,
    timeout: Duration,
    restarts: u64,
}

impl<F: ChannelFactory> Coordinator<F> {
    pub fn new(mut factory: F, timeout: Duration) -> Result<Self, ChannelError> {
        let channel = factory.spawn()?;
        Ok(Self {
            factory,
            channel: Some(channel),
            current_id: 0,
            deadline: None,
            timeout,
            restarts: 0,
        })
    }

    /// Dispatch `text` under a fresh id, superseding any request in flight.
    pub fn trigger(&mut self, text: &str, now: Instant) -> RequestId {
        self.current_id += 1;
        let id = self.current_id;
        self.deadline = Some(now + self.timeout);

        let request = CalculationRequest {
            id,
            text: text.to_string(),
        };
        if let Err(err) = self.send(request.clone()) {
            warn!("Calculation request {id} not delivered ({err}), restarting evaluator");
            self.restart();
            if let Err(err) = self.send(request) {
                warn!("Calculation request {id} dropped: {err}");
            }
        }
        id
    }

    /// Drain arrived responses, then check the deadline.
    ///
    /// A response that arrived before the deadline is accepted even when
    /// polled after it.
    pub fn poll(&mut self, now: Instant) -> PollResult {
        let mut accepted = None;
        if let Some(channel) = self.channel.as_mut() {
            while let Some(response) = channel.try_recv() {
                if response.id != self.current_id {
                    debug!(
                        "Discarding stale calculation {} (current {})",
                        response.id, self.current_id
                    );
                    continue;
                }
                self.deadline = None;
                accepted = Some(response.results);
            }
        }

        if let Some(results) = accepted {
            return PollResult::Ready(results);
        }

        if let Some(deadline) = self.deadline
            && now >= deadline
        {
            warn!(
                "Calculation {} timed out after {:?}, restarting evaluator",
                self.current_id, self.timeout
            );
            self.deadline = None;
            self.restart();
            return PollResult::TimedOut;
        }

        PollResult::Idle
    }

    /// Whether a request is still waiting for its response
    pub fn outstanding(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn current_id(&self) -> RequestId {
        self.current_id
    }

    /// How many times the channel has been torn down and recreated
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn send(&mut self, request: CalculationRequest) -> Result<(), ChannelError> {
        match self.channel.as_mut() {
            Some(channel) => channel.send(request),
            None => Err(ChannelError::Disconnected),
        }
    }

    fn restart(&mut self) {
        // Drop the old channel first so its worker can notice and exit
        self.channel = None;
        self.restarts += 1;
        match self.factory.spawn() {
            Ok(channel) => self.channel = Some(channel),
            Err(err) => warn!("Failed to restart evaluator: {err}"),
        }
    }
}
