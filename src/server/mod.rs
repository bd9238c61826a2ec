//! OAI-PMH verb dispatch engine.
//!
//! [`OaiPmhServer::handle`] turns one [`OaiRequest`](crate::request::OaiRequest)
//! into one [`ResponseDocument`](crate::response::ResponseDocument). Each verb
//! validates its arguments into a per-request context, pulls what it needs from
//! the record source and hands structural data to the response assembler.
//!
//! # Module Organization
//!
//! * [`core`] - Core OaiPmhServer struct and the request entry point
//! * [`builder`] - Configuration and fluent construction
//! * [`identity`] - Repository identity echoed by Identify
//! * `dispatch` - Request context and single-page verbs
//! * `pagination` - ListRecords/ListIdentifiers and resumption tokens
//! * `tests` - Test fixtures and dispatch test cases

pub mod builder;
pub mod core;
mod dispatch;
pub mod identity;
mod pagination;


pub use builder::{OaiPmhServerBuilder, OaiServerConfig};
pub use core::OaiPmhServer;
pub use identity::{DeletedRecordPolicy, RepositoryIdentity};
