pub mod ids;
pub mod object;

pub use ids::*;
pub use object::JsonObject;
