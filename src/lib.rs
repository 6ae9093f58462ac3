//! Declarative site provisioning and deployment for Laravel Forge servers.
//!
//! A deployment file lists the sites of one server; [`reconcile::Reconciler`]
//! converges the server to it through a [`forge::ForgeApi`] implementation.

pub mod config;
pub mod env;
pub mod error;
pub mod forge;
pub mod handlebars;
pub mod reconcile;
pub mod schema;
pub mod secrets;
pub mod template;
pub mod wait;
pub mod workspace;
