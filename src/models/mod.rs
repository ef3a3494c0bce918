//! Wire-protocol and request/response types for the Replit GraphQL API.

mod client_frame;
mod query_request;
mod server_frame;

pub use client_frame::{ClientFrame, StartPayload};
pub use query_request::QueryRequest;
pub use server_frame::{DataPayload, ServerFrame};
