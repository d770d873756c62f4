pub mod error;
pub mod provider;
pub mod traits;
pub mod types;

pub use error::*;
pub use provider::*;
pub use traits::*;
pub use types::*;
