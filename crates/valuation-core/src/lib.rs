pub mod cache;
pub mod error;
pub mod numeric;
pub mod traits;
pub mod types;

pub use cache::*;
pub use error::*;
pub use numeric::*;
pub use traits::*;
pub use types::*;
