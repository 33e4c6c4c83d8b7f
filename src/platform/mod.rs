//! Remote container platform collaborator
//!
//! ## Key Components
//!
//! - [`PlatformApi`] - the five REST calls the deployment pipeline issues
//! - [`HttpPlatform`] - reqwest implementation carrying the access-key header
//! - [`RegistryRef`], [`AppDetail`] - loosely-typed response records
//!
//! ## Endpoints
//!
//! | Call | Route |
//! |---|---|
//! | list registries | `GET /registries` |
//! | create registry | `POST /registries` |
//! | create app | `POST /apps` |
//! | trigger deploy | `POST /apps/{id}/deploy` |
//! | app detail | `GET /apps/{id}` |

pub mod http;
mod models;
mod traits;

pub use http::{HttpConfig, HttpPlatform};
pub use models::{
    AppDetail, NewRegistry, PUBLIC_REGISTRY_HOSTS, PUBLIC_REGISTRY_MARKERS, RegistryRef,
    first_string,
};
pub use traits::{PlatformApi, PlatformError};
