//! # Food order server
//! This crate hosts the HTTP server for the food order engine. It is responsible for:
//! * Authenticating requests with bearer tokens issued by the identity provider.
//! * Mapping each user onto the customer, restaurant or courier profile they act as.
//! * Exposing the order state machine, the order queries and the payment flow as JSON routes.
//! * Talking to the payment gateway over its REST API.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The authenticated routes. See [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
