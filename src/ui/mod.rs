//! Terminal front end

pub mod conversation;
pub mod terminal;

pub use conversation::ChatApp;
pub use terminal::run;
