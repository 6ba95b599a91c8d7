pub mod extraction;
pub mod governance;
pub mod processor; // Image → extraction → governance → outcome

pub use processor::*;
