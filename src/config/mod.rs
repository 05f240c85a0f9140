pub mod schema;

pub use schema::{AuthenticationConfig, Config, GatewayConfig, StoreConfig};
