//! Data Transfer Objects for REST request/response serialization.
//!
//! Request and response envelopes use camelCase keys; stored rows
//! (tasks, messages, audit entries) keep their snake_case column names.

pub mod common_dto;
pub mod feed_dto;
pub mod intake_dto;
pub mod task_dto;

pub use common_dto::*;
pub use feed_dto::*;
pub use intake_dto::*;
pub use task_dto::*;
