/// Coarse change notifications returned from mutating operations. The caller
/// decides what to do with them (refresh a view, re-run summaries); nothing
/// in this crate subscribes to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    TransactionsChanged,
    AccountsChanged,
}

pub(crate) fn push_unique(events: &mut Vec<ChangeEvent>, event: ChangeEvent) {
    if !events.contains(&event) {
        events.push(event);
    }
}
