pub mod solver;

pub use solver::ChallengeSolver;
