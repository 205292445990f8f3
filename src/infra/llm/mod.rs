mod credential;
pub mod openrouter;
mod provider;
mod response_parsing;

pub use credential::{CredentialSource, EnvCredential, StaticCredential};
pub use openrouter::{OpenRouterAdapter, complete, config_from_env};
pub use provider::CompletionProvider;
pub(crate) use response_parsing::{error_chain, truncate_message};
