//! "Already in use" detection within the running session

use crate::binding::candidate::CandidateInput;
use crate::binding::entry::{AxisEntry, ButtonEntry};

/// Returns the description of the entry that already owns `candidate`.
///
/// Only the bindings collected in the current session are scanned, never
/// the controller's persisted table.
pub fn check_in_use<'a>(
    candidate: &CandidateInput,
    buttons: &'a [ButtonEntry],
    axes: &'a [AxisEntry],
) -> Option<&'a str> {
    let owns = |accepted: &Option<CandidateInput>| {
        accepted
            .as_ref()
            .is_some_and(|existing| existing.occupies_same_input(candidate))
    };

    if let Some(entry) = buttons.iter().find(|e| owns(&e.accepted)) {
        return Some(&entry.description);
    }

    axes.iter()
        .find(|e| owns(&e.accepted0) || owns(&e.accepted1))
        .map(|e| e.description.as_str())
}
