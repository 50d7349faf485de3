//! CSV and JSON renderings of assignment results.

use itertools::Itertools;
use serde::Serialize;

use crate::model::entity::{Cost, GroupId};
use crate::model::group::{ParticipantAssignment, Placement};

const UNASSIGNED: i64 = -1;

fn group_field(placement: &Placement) -> i64 {
    placement.group().map_or(UNASSIGNED, |g| g as i64)
}

fn cost_field(placement: &Placement) -> i64 {
    placement.cost().unwrap_or(UNASSIGNED)
}

/// `id,group...[,cost...]`, one line per participant in input order.
pub fn render_csv(assignments: &[ParticipantAssignment], with_costs: bool) -> String {
    assignments
        .iter()
        .map(|a| {
            let groups = a.placements.iter().map(group_field);
            let costs = a.placements.iter().map(cost_field).filter(|_| with_costs);
            std::iter::once(a.participant.clone())
                .chain(groups.chain(costs).map(|v| v.to_string()))
                .join(",")
        })
        .map(|line| line + "\n")
        .collect()
}

#[derive(Serialize)]
#[serde(untagged)]
enum GroupValue {
    Single(Option<GroupId>),
    Phases(Vec<Option<GroupId>>),
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    id: &'a str,
    group: GroupValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    costs: Option<Vec<Option<Cost>>>,
}

/// Pretty JSON array of `{"id", "group"}` objects. `group` is a number for a
/// single phase, an array for split assignments, and `null` when unassigned.
pub fn render_json(assignments: &[ParticipantAssignment], with_costs: bool) -> serde_json::Result<String> {
    let entries = assignments
        .iter()
        .map(|a| JsonEntry {
            id: &a.participant,
            group: match a.placements.as_slice() {
                [single] => GroupValue::Single(single.group()),
                phases => GroupValue::Phases(phases.iter().map(Placement::group).collect()),
            },
            costs: with_costs.then(|| a.placements.iter().map(Placement::cost).collect()),
        })
        .collect_vec();
    serde_json::to_string_pretty(&entries)
}
