//! UTM CLI - command line tools for the UTM backend.
//!
//! Binaries:
//! - send_flight_request: submit a flight request and print the decision

pub mod request;

pub use request::{build_flight_request, parse_position, submit_flight_request};
