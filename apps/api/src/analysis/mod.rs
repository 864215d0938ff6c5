// Resume Intelligence Pipeline
// Implements: prompt building, model reply parsing, recommendations, orchestration.
// All model calls go through llm_client; no direct HTTP calls to the model host here.

pub mod handlers;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod recommendations;
