pub mod config;
pub mod credentials;
pub mod error;
pub mod forms;
pub mod server;
pub mod services;
pub(crate) mod utils;

pub use error::FormsyncError;
pub use forms::FormCreationResult;
pub use services::Services;
