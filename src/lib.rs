//! A client for the Nariz Encantado volunteer management API.
//!
//! The [`SessionContext`] keeps track of who is logged in, the
//! [`ApiClient`] attaches their token to every request, and
//! [`guard::decide()`] works out whether a page may be shown.

#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod client;
pub mod config;
mod credentials;
mod document;
pub mod endpoints;
mod event;
mod financial;
pub mod guard;
pub mod routes;
mod session;
pub mod storage;
mod user;

pub use client::{ApiClient, ApiError};
pub use config::{Config, ConfigError};
pub use credentials::{Credential, CredentialStore};
pub use document::{Document, DocumentType, UnknownDocumentType};
pub use endpoints::{Page, Upload};
pub use event::{
    Event, EventRegistration, EventSummary, NewEvent, RegisteredEvent,
};
pub use financial::{
    FinancialRecord, MonthlySummary, NewFinancialRecord, RecordType,
    UnknownRecordType,
};
pub use guard::{Access, Decision};
pub use routes::{Route, RouteTable};
pub use session::{SessionContext, SessionState};
pub use user::{Message, NewUser, User};

/// The default user agent to use when communicating with the backend.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));
