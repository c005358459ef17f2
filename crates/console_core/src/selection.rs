//! Keeps the controlled-submersible pointer valid against the live roster.

use shared::{domain::SubmarineId, protocol::Submarine};

/// Empty roster clears the selection; a selection still present in the roster
/// is kept; anything else falls back to the first roster entry.
pub fn reconcile(roster: &[Submarine], current: Option<&SubmarineId>) -> Option<SubmarineId> {
    let first = roster.first()?;
    match current {
        Some(id) if roster.iter().any(|sub| &sub.id == id) => Some(id.clone()),
        _ => Some(first.id.clone()),
    }
}
