// zwdc-api: Async clients for the device catalog and its token endpoint

pub mod auth;
pub mod catalog;
pub mod error;
pub mod transport;

pub use auth::{AccessTokenSource, AuthConfig, StaticToken, TokenManager, TokenState};
pub use catalog::client::{CatalogClient, DeviceTypeQuery};
pub use catalog::models::{
    Attribute, Content, ContentVariable, DeviceType, Interaction, Service, variable_type,
};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
