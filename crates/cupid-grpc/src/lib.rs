#![warn(missing_docs)]

//! Cupid gRPC Service Layer
//!
//! Exposes the explore operations via gRPC:
//! - ListLikedYou / ListNewLikedYou, keyset-paginated by actor id
//! - CountLikedYou
//! - PutDecision, recording likes and dislikes and reporting mutual matches
//! - HealthCheck for instance monitoring

// Include generated protobuf code
pub mod proto {
    //! Generated protobuf types and service definitions
    tonic::include_proto!("explore.v1");
}

pub mod conversions;
pub mod server;
pub mod service;

pub use server::{shutdown_signal, start_server, ServerConfig, ServerError};
pub use service::ExploreServiceImpl;
