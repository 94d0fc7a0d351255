pub mod types;
pub mod loader;
pub mod validator;
pub mod resolved;
pub mod cache;
pub mod settings;

pub use types::*;
pub use loader::*;
pub use validator::*;
pub use resolved::*;
pub use cache::SpecCache;
pub use settings::Settings;
