pub mod entity_location;
pub mod error;
pub mod scenegraph;
pub mod species;
pub mod vector;
mod settings;

pub use error::VivariumError;
pub use settings::{Settings, GLOBAL_CONFIG};

pub type BodyId = usize;
