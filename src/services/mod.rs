//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on payload validation and status mapping.

pub mod model;
pub mod object;
pub mod value;
