use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::calc::channel::{
    CalculationRequest, CalculationResponse, ChannelError, ChannelFactory, EvalChannel,
};
use crate::calc::LineEvaluator;

/// Evaluate `text` the way a worker would
pub fn evaluate_all(text: &str) -> Vec<String> {
    LineEvaluator::default().evaluate_text(text)
}

#[derive(Debug, Default)]
struct ChannelState {
    sent: Vec<CalculationRequest>,
    responses: VecDeque<CalculationResponse>,
    disconnected: bool,
}

/// In-memory channel factory. Clones share state, so a test keeps one clone
/// as a handle to script responses while the coordinator owns the other.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFactory {
    channels: Rc<RefCell<Vec<ChannelState>>>,
}

impl ScriptedFactory {
    /// Every request sent on any channel, oldest first
    pub fn sent(&self) -> Vec<CalculationRequest> {
        self.channels
            .borrow()
            .iter()
            .flat_map(|state| state.sent.iter().cloned())
            .collect()
    }

    pub fn sent_on(&self, channel: usize) -> Vec<CalculationRequest> {
        self.channels.borrow()[channel].sent.clone()
    }

    pub fn last_sent(&self) -> Option<CalculationRequest> {
        self.sent().pop()
    }

    pub fn spawned(&self) -> usize {
        self.channels.borrow().len()
    }

    /// Queue a response on the newest channel
    pub fn respond(&self, id: u64, results: Vec<String>) {
        let newest = self.spawned() - 1;
        self.respond_on(newest, id, results);
    }

    pub fn respond_on(&self, channel: usize, id: u64, results: Vec<String>) {
        self.channels.borrow_mut()[channel]
            .responses
            .push_back(CalculationResponse { id, results });
    }

    /// Answer the newest request by really evaluating it
    pub fn answer_latest(&self) {
        if let Some(request) = self.last_sent() {
            self.respond(request.id, evaluate_all(&request.text));
        }
    }

    pub fn disconnect(&self, channel: usize) {
        self.channels.borrow_mut()[channel].disconnected = true;
    }
}

impl ChannelFactory for ScriptedFactory {
    type Channel = ScriptedChannel;

    fn spawn(&mut self) -> Result<ScriptedChannel, ChannelError> {
        let mut channels = self.channels.borrow_mut();
        channels.push(ChannelState::default());
        Ok(ScriptedChannel {
            index: channels.len() - 1,
            channels: Rc::clone(&self.channels),
        })
    }
}

#[derive(Debug)]
pub struct ScriptedChannel {
    index: usize,
    channels: Rc<RefCell<Vec<ChannelState>>>,
}

impl EvalChannel for ScriptedChannel {
    fn send(&mut self, request: CalculationRequest) -> Result<(), ChannelError> {
        let mut channels = self.channels.borrow_mut();
        let state = &mut channels[self.index];
        if state.disconnected {
            return Err(ChannelError::Disconnected);
        }
        state.sent.push(request);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<CalculationResponse> {
        let mut channels = self.channels.borrow_mut();
        let state = &mut channels[self.index];
        if state.disconnected {
            return None;
        }
        state.responses.pop_front()
    }
}
