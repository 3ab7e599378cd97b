pub mod compose;
pub mod history;
