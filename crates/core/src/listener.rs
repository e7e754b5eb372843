use crate::state::RuntimeSnapshot;

/// Receives a fresh snapshot after every tracker change.
///
/// Returning `Err` is reported and otherwise ignored; it never rolls back the
/// tracker's own update.
pub trait ChangeListener: Send {
    fn on_change(&mut self, snapshot: &RuntimeSnapshot) -> anyhow::Result<()>;
}

impl<F> ChangeListener for F
where
    F: FnMut(&RuntimeSnapshot) -> anyhow::Result<()> + Send,
{
    fn on_change(&mut self, snapshot: &RuntimeSnapshot) -> anyhow::Result<()> {
        self(snapshot)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registered listeners in subscription order.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn ChangeListener>)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Box<dyn ChangeListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Deliver `snapshot` to everyone; failures are handed to `on_error`
    /// and delivery continues with the next listener.
    pub(crate) fn notify(
        &mut self,
        snapshot: &RuntimeSnapshot,
        mut on_error: impl FnMut(ListenerId, anyhow::Error),
    ) {
        for (id, listener) in &mut self.entries {
            if let Err(e) = listener.on_change(snapshot) {
                on_error(*id, e);
            }
        }
    }
}
