//! Application specification: data model, image references and config resolution
//!
//! Two mutually exclusive sources feed the same canonical [`AppSpec`]:
//! an inline container list (YAML or JSON text) and a descriptor file.
//! When a descriptor file exists it wins outright; the sources are never
//! merged. Later stages only ever see the resolved [`AppSpec`].
//!
//! # Descriptor file
//!
//! ```yaml
//! name: shop
//! containers:
//!   - name: api
//!     build: true
//!     port: 8080
//!     env:
//!       REDIS_URL: redis://cache:6379
//!     endpoints:
//!       - name: web
//!         type: cdn
//!         portMappings:
//!           - containerPort: 8080
//!             exposedPort: 443
//!   - name: cache
//!     image: redis
//! ```

pub mod image;
mod models;
mod resolver;

pub use image::ImageRef;
pub use models::{
    AppSpec, ContainerSpec, DeploymentType, EndpointKind, EndpointSpec, EnvVar, PortMapping,
    RawContainer, RawDescriptor, SourceKind,
};
pub use resolver::{ResolveDefaults, SpecError, SpecSource, resolve, select_source};
