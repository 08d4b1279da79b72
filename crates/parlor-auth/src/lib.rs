//! # parlor-auth
//!
//! Bearer credential handling for the Parlor gateway:
//!
//! - JWT claims carried by chat connection tokens
//! - Token verification (the gateway's side of the contract)
//! - Token issuance, used by tests and dev tooling; production tokens come
//!   from the surrounding platform

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::Claims;
pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;
