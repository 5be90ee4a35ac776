pub mod body;
pub mod environment;
pub mod gait;
pub mod linkage;
pub mod physics;
pub mod server;
pub mod vivarium;
