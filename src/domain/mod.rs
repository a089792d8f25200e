pub mod clock;
pub mod ids;
pub mod repository;
pub mod todo;
