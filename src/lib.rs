pub mod engine;
pub mod model;
pub mod remote;
pub mod shell;
