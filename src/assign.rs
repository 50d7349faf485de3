//! Single- and two-phase assignment.
//!
//! A preference vector can be split into two blocks (for example morning and
//! afternoon groups) that are solved as independent problems. Forbidden pairs
//! between the blocks are enforced softly: once one block is solved, the
//! other block's costs for forbidden follow-up groups are raised by a penalty.
//! Both block orders are tried and the cheaper result wins. This approximates
//! the joint optimum and can still produce a forbidden combination when the
//! penalty is not large enough to outweigh the alternatives.

use itertools::{zip_eq, Itertools};
use tracing::{debug, warn};

use crate::extract::extract_assignments;
use crate::matrix::build_cost_matrix;
use crate::model::condition::{ForbiddenPairs, DEFAULT_PENALTY};
use crate::model::entity::{Cost, Participant};
use crate::model::group::ParticipantAssignment;
use crate::munkres;
use crate::{Error, Result};

/// An assignment problem and how to decompose it.
#[derive(Debug, Clone)]
pub struct Problem {
    participants: Vec<Participant>,
    split: Option<usize>,
    forbidden: ForbiddenPairs,
    penalty: Cost,
}

impl Problem {
    pub fn new(participants: Vec<Participant>) -> Problem {
        Problem {
            participants,
            split: None,
            forbidden: ForbiddenPairs::default(),
            penalty: DEFAULT_PENALTY,
        }
    }

    /// Splits every preference vector before index `split`. Values outside
    /// `1..preference_count` fall back to a single assignment.
    pub fn with_split(mut self, split: usize) -> Problem {
        self.split = Some(split);
        self
    }

    pub fn with_forbidden(mut self, forbidden: ForbiddenPairs) -> Problem {
        self.forbidden = forbidden;
        self
    }

    pub fn with_penalty(mut self, penalty: Cost) -> Problem {
        self.penalty = penalty;
        self
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Solves the problem; results are in input order with one placement per
    /// block, block A first.
    pub fn solve(&self) -> Result<Vec<ParticipantAssignment>> {
        let Some(first) = self.participants.first() else {
            return Ok(Vec::new());
        };
        let width = first.preferences.len();
        if width == 0 {
            return Ok(Vec::new());
        }

        let split = match self.split {
            Some(split) if (1..width).contains(&split) => split,
            Some(split) => {
                debug!(split, width, "split index out of range, using a single assignment");
                return simple_assignment(&self.participants);
            }
            None => return simple_assignment(&self.participants),
        };

        let (block_a, block_b) = split_participants(&self.participants, split)?;
        if self.forbidden.is_empty() {
            debug!(split, "solving blocks independently");
            return Ok(merge_assignments(simple_assignment(&block_a)?, simple_assignment(&block_b)?));
        }

        self.check_forbidden(split, width)?;
        let (a, b) = assign_with_penalty(&block_a, &block_b, &self.forbidden, self.penalty)?;
        let forward = merge_assignments(a, b);
        let (b, a) = assign_with_penalty(&block_b, &block_a, &self.forbidden.reversed(), self.penalty)?;
        let backward = merge_assignments(a, b);
        Ok(choose_min_cost(vec![forward, backward]))
    }

    fn check_forbidden(&self, split: usize, width: usize) -> Result<()> {
        match self.forbidden.iter().find(|&&(a, b)| a >= split || b >= width - split) {
            Some((a, b)) => Err(Error::Configuration(format!(
                "forbidden pair {a}-{b} is outside the blocks of {split} and {} groups",
                width - split
            ))),
            None => Ok(()),
        }
    }
}

/// Builds, solves and extracts one assignment over the full preference vectors.
pub fn simple_assignment(participants: &[Participant]) -> Result<Vec<ParticipantAssignment>> {
    let Some(first) = participants.first() else {
        return Ok(Vec::new());
    };
    let group_count = first.preferences.len();
    let costs = build_cost_matrix(participants, group_count)?;
    debug!(rows = costs.rows(), columns = costs.columns(), "cost matrix:\n{costs}");

    let solution = munkres::solve(costs.clone())?;
    debug!(total = solution.total_cost(&costs), "solved assignment");
    Ok(extract_assignments(participants, &costs, &solution, group_count))
}

/// Cuts each preference vector into `[0, split)` and `[split, end)`.
pub fn split_participants(participants: &[Participant], split: usize) -> Result<(Vec<Participant>, Vec<Participant>)> {
    participants
        .iter()
        .map(|p| {
            if split == 0 || split >= p.preferences.len() {
                return Err(Error::Configuration(format!(
                    "cannot split {} preferences of '{}' before index {split}",
                    p.preferences.len(),
                    p.id
                )));
            }
            let (a, b) = p.preferences.split_at(split);
            Ok((Participant::new(p.id.clone(), a.to_vec()), Participant::new(p.id.clone(), b.to_vec())))
        })
        .process_results(|pairs| pairs.unzip())
}

/// Appends the placements of `second` to those of `first`, participant by participant.
pub fn merge_assignments(
    first: Vec<ParticipantAssignment>,
    second: Vec<ParticipantAssignment>,
) -> Vec<ParticipantAssignment> {
    zip_eq(first, second).map(|(a, b)| a + b).collect()
}

/// Solves `primary`, penalizes the forbidden follow-ups in `secondary` and
/// solves that. Returns `(primary, secondary)` results.
pub fn assign_with_penalty(
    primary: &[Participant],
    secondary: &[Participant],
    forbidden: &ForbiddenPairs,
    penalty: Cost,
) -> Result<(Vec<ParticipantAssignment>, Vec<ParticipantAssignment>)> {
    let first = simple_assignment(primary)?;
    let mut secondary = secondary.to_vec();
    for (assignment, participant) in first.iter().zip(secondary.iter_mut()) {
        let Some(group) = assignment.last_group() else {
            continue;
        };
        for excluded in forbidden.excluded_by(group) {
            if let Some(cost) = participant.preferences.get_mut(excluded) {
                *cost = cost.checked_add(penalty).ok_or_else(|| {
                    Error::Configuration(format!("penalty {penalty} overflows the cost of '{}'", participant.id))
                })?;
            }
        }
    }
    let second = simple_assignment(&secondary)?;
    Ok((first, second))
}

/// Picks the candidate with the lowest total cost, the earliest on ties.
pub fn choose_min_cost(candidates: Vec<Vec<ParticipantAssignment>>) -> Vec<ParticipantAssignment> {
    let totals = candidates.iter().map(|candidate| total_cost(candidate)).collect_vec();
    warn!(?totals, "heuristic found assignments with costs");
    match totals.iter().position_min() {
        Some(best) => candidates.into_iter().nth(best).unwrap_or_default(),
        None => Vec::new(),
    }
}

/// Sum of all placement costs.
pub fn total_cost(assignments: &[ParticipantAssignment]) -> Cost {
    assignments.iter().map(ParticipantAssignment::total_cost).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::group::Placement;

    fn participants(prefs: &[&[Cost]]) -> Vec<Participant> {
        prefs
            .iter()
            .enumerate()
            .map(|(i, p)| Participant::new(format!("p{i}"), p.to_vec()))
            .collect()
    }

    fn groups(assignments: &[ParticipantAssignment]) -> Vec<Vec<Option<usize>>> {
        assignments.iter().map(|a| a.groups().collect()).collect()
    }

    #[test]
    fn test_empty_problem() {
        assert!(Problem::new(Vec::new()).solve().unwrap().is_empty());
        let no_prefs = vec![Participant::new("a", Vec::new())];
        assert!(Problem::new(no_prefs).solve().unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_split_falls_back() {
        let ps = participants(&[&[1, 2, 3], &[3, 1, 2], &[2, 3, 1]]);
        let plain = Problem::new(ps.clone()).solve().unwrap();
        for split in [0, 3, 7] {
            let result = Problem::new(ps.clone()).with_split(split).solve().unwrap();
            assert_eq!(result, plain);
        }
        assert_eq!(groups(&plain), vec![vec![Some(0)], vec![Some(1)], vec![Some(2)]]);
    }

    #[test]
    fn test_split_without_forbidden_pairs() {
        let ps = participants(&[&[1, 4, 1, 5], &[2, 3, 1, 4], &[4, 1, 3, 1], &[3, 2, 2, 1]]);
        let result = Problem::new(ps).with_split(2).solve().unwrap();

        assert_eq!(
            groups(&result),
            vec![
                vec![Some(0), Some(0)],
                vec![Some(0), Some(0)],
                vec![Some(1), Some(1)],
                vec![Some(1), Some(1)],
            ]
        );
        assert_eq!(total_cost(&result), 10);
    }

    #[test]
    fn test_forbidden_pair_picks_cheaper_ordering() {
        let ps = participants(&[&[1, 4, 1, 5], &[2, 3, 1, 4], &[4, 1, 3, 1], &[3, 2, 2, 1]]);
        let forbidden: ForbiddenPairs = [(0, 0)].into_iter().collect();
        let result = Problem::new(ps).with_split(2).with_forbidden(forbidden).solve().unwrap();

        // solving block B first costs 18, block A first costs 20
        assert_eq!(total_cost(&result), 18);
        assert_eq!(
            groups(&result),
            vec![
                vec![Some(1), Some(0)],
                vec![Some(1), Some(0)],
                vec![Some(0), Some(1)],
                vec![Some(0), Some(1)],
            ]
        );
        assert_eq!(result[0].placements[0], Placement::Assigned { group: 1, cost: 4 });
    }

    #[test]
    fn test_penalty_is_applied_to_secondary_block() {
        let a = participants(&[&[1, 4], &[2, 3], &[4, 1], &[3, 2]]);
        let b = participants(&[&[1, 5], &[1, 4], &[3, 1], &[2, 1]]);
        let forbidden: ForbiddenPairs = [(0, 0)].into_iter().collect();

        let (first, second) = assign_with_penalty(&a, &b, &forbidden, 100).unwrap();
        assert_eq!(total_cost(&first), 6);
        assert_eq!(total_cost(&second), 14);
        assert!(first.iter().zip(&second).all(|(x, y)| !(x.last_group() == Some(0) && y.last_group() == Some(0))));
    }

    #[test]
    fn test_weak_penalty_keeps_forbidden_combination() {
        let a = participants(&[&[1, 9], &[9, 1]]);
        let b = participants(&[&[1, 50], &[50, 1]]);
        let forbidden: ForbiddenPairs = [(0, 0)].into_iter().collect();

        let (first, second) = assign_with_penalty(&a, &b, &forbidden, 5).unwrap();
        assert_eq!(first[0].last_group(), Some(0));
        assert_eq!(second[0].placements[0], Placement::Assigned { group: 0, cost: 6 });
    }

    #[test]
    fn test_symmetric_orderings_cost_the_same() {
        let block = participants(&[&[1, 3], &[2, 1], &[3, 2], &[1, 1]]);
        let forbidden: ForbiddenPairs = [(0, 1), (1, 0)].into_iter().collect();
        assert_eq!(forbidden.reversed(), forbidden);

        let (a1, b1) = assign_with_penalty(&block, &block, &forbidden, DEFAULT_PENALTY).unwrap();
        let (b2, a2) = assign_with_penalty(&block, &block, &forbidden.reversed(), DEFAULT_PENALTY).unwrap();
        assert_eq!(total_cost(&a1) + total_cost(&b1), total_cost(&a2) + total_cost(&b2));
    }

    #[test]
    fn test_forbidden_pair_outside_blocks() {
        let ps = participants(&[&[1, 2, 3], &[3, 2, 1]]);
        let forbidden: ForbiddenPairs = [(0, 2)].into_iter().collect();
        let err = Problem::new(ps).with_split(1).with_forbidden(forbidden).solve().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_huge_costs_fail_instead_of_overflowing() {
        let ps = vec![Participant::new("a", vec![i64::MIN, i64::MAX]), Participant::new("b", vec![0, 0])];
        assert!(matches!(Problem::new(ps).solve(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_penalty_overflow_is_a_configuration_error() {
        let ps = vec![Participant::new("a", vec![0, 1, 9_223_372_036_854_775_800, 0])];
        let forbidden: ForbiddenPairs = [(0, 0)].into_iter().collect();
        let result = Problem::new(ps.clone()).with_split(2).with_forbidden(forbidden.clone()).solve();
        assert!(matches!(result, Err(Error::Configuration(_))));

        let (a, b) = split_participants(&ps, 2).unwrap();
        let err = assign_with_penalty(&a, &b, &forbidden, DEFAULT_PENALTY).unwrap_err();
        assert!(matches!(err, Error::Configuration(message) if message.contains("overflows")));
    }

    #[test]
    fn test_penalized_cost_above_limit_is_rejected() {
        use crate::model::entity::MAX_COST;
        let a = participants(&[&[0, 1]]);
        let b = participants(&[&[MAX_COST, 0]]);
        let forbidden: ForbiddenPairs = [(0, 0)].into_iter().collect();
        assert!(assign_with_penalty(&a, &b, &forbidden, DEFAULT_PENALTY).is_err());
    }

    #[test]
    fn test_split_participants_rejects_short_vectors() {
        let ps = participants(&[&[1, 2, 3], &[1]]);
        assert!(split_participants(&ps, 2).is_err());
    }

    #[test]
    fn test_choose_min_cost_prefers_first_on_tie() {
        let one = vec![ParticipantAssignment::new("a".into(), Placement::Assigned { group: 0, cost: 3 })];
        let two = vec![ParticipantAssignment::new("a".into(), Placement::Assigned { group: 1, cost: 3 })];
        let three = vec![ParticipantAssignment::new("a".into(), Placement::Assigned { group: 2, cost: 1 })];

        assert_eq!(choose_min_cost(vec![one.clone(), two.clone()]), one);
        assert_eq!(choose_min_cost(vec![one, two, three.clone()]), three);
        assert!(choose_min_cost(Vec::new()).is_empty());
    }

    #[test]
    fn test_choose_min_cost_sums_every_phase() {
        let assigned = |group, cost| Placement::Assigned { group, cost };
        let pair = |id: &str, first, second| {
            ParticipantAssignment::new(id.into(), first) + ParticipantAssignment::new(id.into(), second)
        };
        let cheap_first_phase = vec![pair("a", assigned(0, 1), assigned(1, 9)), pair("b", assigned(1, 1), assigned(0, 9))];
        let balanced = vec![pair("a", assigned(1, 4), Placement::Unassigned), pair("b", assigned(0, 4), assigned(1, 4))];

        assert_eq!(total_cost(&cheap_first_phase), 20);
        assert_eq!(total_cost(&balanced), 12);
        assert_eq!(choose_min_cost(vec![cheap_first_phase, balanced.clone()]), balanced);
    }
}
