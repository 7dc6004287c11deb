//! Nubix Metering-Point Lookup Client Library
//!
//! This library looks up electricity metering points, grid owners and meter-reading
//! status through the Statnett Nubix service, triangulating ambiguous identities
//! over several candidate queries and estimating whether a supplier switch needs a
//! physical meter reading.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core lookup logic.
//! - `integrations`: External service integrations.
//! - `candidates`: Candidate query generation.
//! - `config`: Configuration management.
//! - `deep_find`: Depth-first key lookup over decoded responses.
//! - `errors`: Error handling types.
//! - `gateway_client`: Nubix SOAP client and the gateway trait.
//! - `handlers`: HTTP request handlers.
//! - `holidays`: Public-holiday calendars.
//! - `models`: Core data models.
//! - `normalization`: Response normalization into fixed types.
//! - `reading_need`: Meter-reading-need estimation.
//! - `soap`: Request envelope rendering.
//! - `triangulation`: Candidate fan-out, retry and merge.
//! - `xml_tree`: XML decoding into keyed trees.

pub mod api;
pub mod core;
pub mod integrations;

pub mod candidates;
pub mod config;
pub mod deep_find;
pub mod errors;
pub mod gateway_client;
pub mod handlers;
pub mod holidays;
pub mod models;
pub mod normalization;
pub mod reading_need;
pub mod soap;
pub mod triangulation;
pub mod xml_tree;
