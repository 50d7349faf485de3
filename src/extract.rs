use itertools::Itertools;
use tracing::warn;

use crate::matrix::{logical_group, Matrix};
use crate::model::entity::{Cost, Participant};
use crate::model::group::{ParticipantAssignment, Placement};
use crate::munkres::Solution;

/// Turns a solved matching back into one placement per participant.
///
/// Participants are the matrix columns. A participant without a matched seat
/// becomes [`Placement::Unassigned`]; one with several matched seats keeps the
/// first by row order. Both cases are logged and do not abort the run. The
/// reported cost is read from `costs`, the matrix as it was before solving.
pub fn extract_assignments(
    participants: &[Participant],
    costs: &Matrix<Cost>,
    solution: &Solution,
    group_count: usize,
) -> Vec<ParticipantAssignment> {
    participants
        .iter()
        .enumerate()
        .map(|(column, participant)| {
            let rows = solution.selected_rows(column).collect_vec();
            let placement = match rows.as_slice() {
                [] => {
                    warn!(participant = %participant.id, "participant could not be assigned to a group");
                    Placement::Unassigned
                }
                [row, rest @ ..] => {
                    if !rest.is_empty() {
                        let groups = rows.iter().map(|&r| logical_group(r, group_count)).collect_vec();
                        warn!(
                            participant = %participant.id,
                            ?groups,
                            "participant was assigned to multiple groups, using the first"
                        );
                    }
                    Placement::Assigned {
                        group: logical_group(*row, group_count),
                        cost: costs[(*row, column)],
                    }
                }
            };
            ParticipantAssignment::new(participant.id.clone(), placement)
        })
        .collect()
}
