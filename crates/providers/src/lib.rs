//! Collaborator implementations for VaxChecker.
//!
//! All clients implement traits from `vaxchecker_core`. `build_from_config`
//! wires them up from an [`AppConfig`](vaxchecker_config::AppConfig).

pub mod bedrock;
mod http;
pub mod knowledge_base;
pub mod resolver;
pub mod services;

pub use bedrock::BedrockCompletion;
pub use knowledge_base::KnowledgeBaseClient;
pub use resolver::{NoopResolver, S3TagUrlResolver, StaticUrlResolver, parse_s3_uri};
pub use services::{Services, build_from_config};
