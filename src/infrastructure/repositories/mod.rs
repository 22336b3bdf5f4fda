//! Repository implementations using SeaORM

pub mod user_repository;

pub use user_repository::SeaOrmUserRepository;
