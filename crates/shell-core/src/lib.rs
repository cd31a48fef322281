pub mod config;
pub mod error;
pub mod framing;
pub mod message;
pub mod route;

pub use config::AppConfig;
pub use error::ShellError;
pub use framing::{FramingMode, OutputFrame};
pub use message::{ShellRequest, StartParams};
pub use route::ConnectionQuery;
