pub mod api_types;
pub mod controller;
pub mod llm;
pub mod providers;
pub mod retry;

pub use api_types::{Message, MessagesResponse, Role};
pub use controller::{CompanionController, TurnOutcome, TurnSettings};
pub use llm::{CompletionParams, LlmClient};
pub use providers::build_client;
pub use retry::{RetryConfig, UpstreamError};
