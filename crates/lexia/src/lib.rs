//! # Lexia - Court Case Request Monitor
//!
//! Lexia keeps track of *solicitudes*: standing requests to watch a court
//! case, searched either by its radicado number or by a party name, and
//! the execution history the backend records for each of them.
//!
//! The heavy lifting lives in the sibling crates:
//!
//! - [`lexia_seeker`]: field values, filters and ordering over records
//! - [`lexia_table`]: search, filter, sort, paging and selection state
//! - [`lexia_validate`]: field rules with cached, cancellable async checks
//!
//! This crate ties them to the domain:
//!
//! - [`model`]: solicitudes, executions, dashboard numbers
//! - [`api`]: the backend seam, over HTTP or in memory
//! - [`auth`]: registration, login and the current user
//! - [`supervisor`]: failures turned into incidents instead of aborts
//! - [`config`], [`logging`], [`output`], [`cli`]: the terminal front end

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod logging;
pub mod model;
pub mod output;
pub mod supervisor;

pub use api::{ApiError, Dataset, HttpApi, InMemoryApi, SolicitudesApi};
pub use auth::AuthApi;
pub use config::{load_config, ConfigError, LexiaConfig};
pub use model::{
    AccessToken, AccountType, DashboardStats, Ejecucion, ExecutionReport, ExtractionStatus,
    Frequency, NuevaSolicitud, NuevoUsuario, SearchKind, Solicitud, SolicitudUpdate, Usuario,
};
pub use supervisor::{Incident, Supervised, Supervisor};
