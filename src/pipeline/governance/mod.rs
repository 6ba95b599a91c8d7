pub mod types;
pub mod rules;
pub mod validator;

pub use types::*;
pub use rules::*;
pub use validator::*;
