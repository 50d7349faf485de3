pub mod entity {
    pub type Id = String;
    pub type Cost = i64;
    pub type GroupId = usize;

    /// Largest accepted cost magnitude. Keeps every reduction, penalty and
    /// total in the solver far away from `i64` overflow.
    pub const MAX_COST: Cost = 1 << 40;

    /// One line of input: who, and how much they dislike each group.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Participant {
        pub id: Id,
        pub preferences: Vec<Cost>,
    }

    impl Participant {
        pub fn new(id: impl Into<Id>, preferences: Vec<Cost>) -> Participant {
            Participant { id: id.into(), preferences }
        }
    }
}


pub mod group {
    use std::ops::Add;
    use super::entity::{Cost, GroupId, Id};

    /// Outcome of a single assignment phase for one participant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Placement {
        Assigned { group: GroupId, cost: Cost },
        Unassigned,
    }

    impl Placement {
        pub fn group(&self) -> Option<GroupId> {
            match self {
                Placement::Assigned { group, .. } => Some(*group),
                Placement::Unassigned => None,
            }
        }
        pub fn cost(&self) -> Option<Cost> {
            match self {
                Placement::Assigned { cost, .. } => Some(*cost),
                Placement::Unassigned => None,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct ParticipantAssignment {
        pub participant: Id,
        pub placements: Vec<Placement>,
    }

    impl ParticipantAssignment {
        pub fn new(participant: Id, placement: Placement) -> ParticipantAssignment {
            ParticipantAssignment { participant, placements: vec![placement] }
        }
        pub fn groups(&self) -> impl Iterator<Item = Option<GroupId>> + '_ {
            self.placements.iter().map(Placement::group)
        }
        /// Group of the most recent phase.
        pub fn last_group(&self) -> Option<GroupId> {
            self.placements.last().and_then(Placement::group)
        }
        /// Unassigned phases contribute nothing.
        pub fn total_cost(&self) -> Cost {
            self.placements.iter().filter_map(Placement::cost).sum()
        }
    }

    impl Add for ParticipantAssignment {
        type Output = Self;

        fn add(self, rhs: Self) -> Self::Output {
            debug_assert_eq!(self.participant, rhs.participant);
            let mut placements = self.placements;
            placements.extend(rhs.placements);
            ParticipantAssignment { participant: self.participant, placements }
        }
    }
}

pub mod condition {
    use std::collections::BTreeSet;
    use std::str::FromStr;
    use thiserror::Error;
    use super::entity::{Cost, GroupId};

    /// Added to a secondary preference when it would complete a forbidden pair.
    pub const DEFAULT_PENALTY: Cost = 10_000;

    /// Pairs of (group in block A, group in block B) that should not be
    /// given to the same participant. Indices are local to each block.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct ForbiddenPairs(pub BTreeSet<(GroupId, GroupId)>);

    impl ForbiddenPairs {
        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }
        pub fn iter(&self) -> impl Iterator<Item = &(GroupId, GroupId)> {
            self.0.iter()
        }
        pub fn reversed(&self) -> ForbiddenPairs {
            self.0.iter().map(|&(a, b)| (b, a)).collect()
        }
        /// Second elements of all pairs starting with `group`.
        pub fn excluded_by(&self, group: GroupId) -> impl Iterator<Item = GroupId> + '_ {
            self.0.iter().filter(move |(a, _)| *a == group).map(|(_, b)| *b)
        }
    }

    impl FromIterator<(GroupId, GroupId)> for ForbiddenPairs {
        fn from_iter<T: IntoIterator<Item = (GroupId, GroupId)>>(iter: T) -> Self {
            ForbiddenPairs(iter.into_iter().collect())
        }
    }

    #[derive(Debug, Clone, Error, PartialEq)]
    pub enum PairParseError {
        #[error("expected <a>-<b>, got '{0}'")]
        Malformed(String),
        #[error("invalid group index '{0}'")]
        InvalidGroup(String),
    }

    /// Parses `0-1,2-3`.
    impl FromStr for ForbiddenPairs {
        type Err = PairParseError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let parse_group = |text: &str| {
                text.trim().parse::<GroupId>().map_err(|_| PairParseError::InvalidGroup(text.trim().to_string()))
            };
            s.split(',')
                .filter(|item| !item.trim().is_empty())
                .map(|item| -> Result<(GroupId, GroupId), PairParseError> {
                    let (a, b) = item.split_once('-').ok_or_else(|| PairParseError::Malformed(item.to_string()))?;
                    Ok((parse_group(a)?, parse_group(b)?))
                })
                .collect()
        }
    }

}
