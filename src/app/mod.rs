pub mod command;
pub mod controller;
pub mod key_bindings;
pub mod runtime;
pub mod watch;

pub use controller::{AppExit, FormApp};
pub use runtime::Runtime;
