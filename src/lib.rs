//! Campaign generation and field-by-field copy refinement for product photos.
//!
//! [`CampaignSession`] takes a product image through generation into a
//! [`CampaignResult`] held in a [`ResultStore`]; [`RefinementWorkflow`] then
//! edits one marketing copy field at a time against a [`RefinementClient`].

pub mod bedrock;
pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod refinement;
#[cfg(feature = "server")]
pub mod server;
pub mod session;
pub mod store;

pub use bedrock::BedrockCampaignService;
pub use client::{GenerationClient, HttpCampaignClient, RefinementClient};
pub use config::{BedrockConfig, Config};
pub use error::{AdForgeError, Result, WorkflowError};
pub use models::*;
pub use refinement::{RefineOutcome, RefinementView, RefinementWorkflow, WorkflowState};
pub use session::{CampaignSession, SessionState, SubmitOutcome};
pub use store::ResultStore;
