//! Monitor backend protocol types.
//!
//! Wire-compatible payload structures, grouped by concern:
//! - [`events`]: push events, push commands, and the name→handler dispatch.
//! - [`responses`]: REST response payloads.
//! - [`status`]: device status with permissive decoding.

pub mod events;
pub mod responses;
pub mod status;
