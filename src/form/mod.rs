pub mod focus;
pub mod session;
pub mod tree;

pub use session::{FormError, FormSession, SessionOptions, SubmitOutcome};
pub use tree::{FieldState, FormNode};
