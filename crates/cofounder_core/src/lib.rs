pub mod domain;
pub mod ports;

pub use domain::{
    AgentMessage, Conversation, Design, Memory, Message, Role, SessionSummary, Startup,
    StartupMetrics, StartupStage,
};
pub use ports::{
    ChatCompletionService, DocumentStore, ImageGenerationService, PortError, PortResult,
    SimulationService,
};
