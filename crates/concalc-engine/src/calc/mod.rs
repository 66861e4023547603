pub mod adapter;
pub mod channel;
pub mod coordinator;

pub use adapter::{DEFAULT_PRECISION, LineEvaluator};
pub use channel::{
    CalculationRequest, CalculationResponse, ChannelError, ChannelFactory, EvalChannel,
    RequestId, WorkerChannel, WorkerFactory,
};
pub use coordinator::{Coordinator, DEFAULT_CALCULATION_TIMEOUT, PollResult};
