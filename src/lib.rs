//! Preference-driven group assignment.
//!
//! Participants rank every group with a cost (lower is better). The groups are
//! filled by solving a minimum-cost perfect matching between participants and
//! replicated group "seats" with the Kuhn-Munkres algorithm. Preference vectors
//! can be split into two independent blocks, optionally with pairs of groups
//! that should not be combined for the same participant.
//!
//! ```rust,ignore
//! use group_assign::{Participant, Problem};
//!
//! let participants = vec![
//!     Participant::new("jack", vec![1, 5]),
//!     Participant::new("jill", vec![6, 2]),
//! ];
//! let assignments = Problem::new(participants).solve()?;
//! ```

pub mod model;
pub mod matrix;
pub mod munkres;
pub mod extract;
pub mod assign;
pub mod input;
pub mod report;

pub use model::entity::{Cost, GroupId, Id, Participant};
pub use model::group::{ParticipantAssignment, Placement};
pub use model::condition::{ForbiddenPairs, DEFAULT_PENALTY};
pub use assign::Problem;

pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        Configuration(String),

        #[error("Infeasible problem: {rows} seats cannot cover {columns} participants")]
        InfeasibleProblem { rows: usize, columns: usize },
    }

    pub type Result<T> = std::result::Result<T, Error>;
}
