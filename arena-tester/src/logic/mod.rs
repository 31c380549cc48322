pub mod checks;
pub mod policy;
pub mod reports;
pub mod runner;

pub use checks::Check;
pub use runner::{LogicTester, SeedResult};
