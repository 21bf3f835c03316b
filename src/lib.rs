//! # legalops-router
//!
//! Human-in-the-loop task routing for legal-operations intake.
//!
//! Client messages are ingested, classified by an LLM into typed tasks,
//! turned into proposals by specialist agents, reviewed by a human, and
//! executed as audited actions. Model calls can be mocked end to end.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── WorkflowService + scheduler (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── LlmGateway → Gemini (llm/)
//!     │
//!     └── WorkflowStore: PostgreSQL | in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod persistence;
pub mod service;
pub mod ws;
