//! Data-access layer for the warehouse task-management front end.
//!
//! # Overview
//! Every exchange between the UI and the warehouse backend (stocks, tasks,
//! materials, weighing jobs, authentication) goes through this crate. It
//! holds the client session, builds requests, interprets status codes, and
//! shapes response bodies into typed values.
//!
//! # Design
//! - `WarehouseClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. No I/O happens there.
//! - `Session` is an explicit value; there is no global session.
//! - `WarehouseApi` composes session, client, a `Transport`, a `TokenStore`
//!   and a `TokenDecoder` into one call per backend operation.
//! - The crate never navigates. Errors and login results carry a
//!   `Navigation` directive the calling layer acts on.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod jwt;
pub mod navigation;
pub mod policy;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

pub use api::WarehouseApi;
pub use client::WarehouseClient;
pub use config::ClientConfig;
pub use error::{ApiError, LOGIN_REJECTED_MESSAGE};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use jwt::{Claims, TokenDecoder, UnverifiedJwtDecoder};
pub use navigation::{Navigation, Notice};
pub use session::Session;
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::Transport;
pub use types::{
    ChangePassword, CheckItemRequest, CheckItemResult, Job, JobStatusUpdate, JobsStatusUpdate,
    LoginPayload, Record, RestGrossWeightUpdate, Stock, TaskDetail, TaskProgress, TaskSummary, User,
};
