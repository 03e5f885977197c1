pub mod chat_llm;
pub mod db;
pub mod image_gen;
pub mod in_memory;
pub mod openai_client;
pub mod simulation_llm;

pub use chat_llm::OpenAiChatAdapter;
pub use db::DbAdapter;
pub use image_gen::OpenAiImageAdapter;
pub use in_memory::InMemoryStore;
pub use openai_client::OpenAiClientProvider;
pub use simulation_llm::OpenAiSimulationAdapter;
