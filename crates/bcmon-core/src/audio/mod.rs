//! Audio routing module
//!
//! This module contains the multi-channel audio routing engine:
//! - Channel routing and power-preserving downmix matrices ([`routing`])
//! - Loudness-normalisation profiles and stage parameters ([`loudness`])
//! - Structured filter-chain descriptors ([`chain`])
//! - Active audio track properties ([`track`])
//! - Routing/loudness mode state machine ([`router`])

pub mod chain;
pub mod loudness;
pub mod router;
pub mod routing;
pub mod track;
