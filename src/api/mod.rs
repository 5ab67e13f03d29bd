//! REST client for the ClinicDesk auth API.
//!
//! The auth API is an external collaborator of the session core: it accepts
//! credentials and returns a bearer token plus identity. Everything else
//! (patients, appointments, inventory) talks to the API elsewhere in the
//! application using the token this module obtains.

pub mod client;
pub mod error;

pub use client::{AccountResponse, AuthClient};
pub use error::ApiError;
