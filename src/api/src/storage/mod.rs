//! SQLite storage for imported race pages
//!
//! One database holds races, per-runner results, payouts and the pedigree
//! table filled from horse pages.

pub mod repository;
pub mod schema;

pub use repository::RaceRepository;
pub use schema::create_tables;
