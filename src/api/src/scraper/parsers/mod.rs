//! Record builders for db.netkeiba.com pages.
//!
//! Each builder takes a parsed document and the page id and returns its
//! records independently of the others.

pub mod payoff;
pub mod pedigree;
pub mod race;
pub mod result;

pub use payoff::PayoffParser;
pub use pedigree::PedigreeParser;
pub use race::RaceInfoParser;
pub use result::RaceResultParser;
