use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, RwLock,
    },
};

use super::PlantSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The collection changed; carries the state after the change.
    Changed(PlantSnapshot),
    /// A save did not reach storage. The in-memory change still stands.
    SaveFailed { message: String },
}

pub type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Outbox {
    queue: VecDeque<StoreEvent>,
    draining: bool,
}

/// Subscribers plus the queue of events not yet delivered to them.
///
/// Events are queued in the order the store produced them and delivered by
/// one thread at a time, so every listener sees every state in that order.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: AtomicU64,
    entries: RwLock<Vec<(ListenerId, Listener)>>,
    outbox: Mutex<Outbox>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Queue an event behind everything queued before it. The store calls
    /// this while it still holds the collection lock.
    pub(crate) fn queue(&self, event: StoreEvent) {
        self.lock_outbox().queue.push_back(event);
    }

    /// Deliver queued events until the queue is empty. If another call is
    /// already delivering, it picks up whatever was queued and this returns
    /// at once. Listeners may call back into the store.
    pub(crate) fn deliver_queued(&self) {
        {
            let mut outbox = self.lock_outbox();
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }
        let mut drain = DrainGuard {
            listeners: self,
            finished: false,
        };

        loop {
            let event = {
                let mut outbox = self.lock_outbox();
                match outbox.queue.pop_front() {
                    Some(event) => event,
                    None => {
                        outbox.draining = false;
                        drain.finished = true;
                        return;
                    }
                }
            };
            self.notify(&event);
        }
    }

    pub(crate) fn emit(&self, event: StoreEvent) {
        self.queue(event);
        self.deliver_queued();
    }

    /// Invoke every listener in subscription order.
    fn notify(&self, event: &StoreEvent) {
        let listeners: Vec<Listener> = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    fn lock_outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases the delivery role if a listener panics mid-drain.
struct DrainGuard<'a> {
    listeners: &'a Listeners,
    finished: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.listeners.lock_outbox().draining = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(checked_count: usize) -> StoreEvent {
        let mut snapshot = PlantSnapshot::from_plants(&[]);
        snapshot.checked_count = checked_count;
        StoreEvent::Changed(snapshot)
    }

    fn count_of(event: &StoreEvent) -> usize {
        match event {
            StoreEvent::Changed(snapshot) => snapshot.checked_count,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn events_queued_during_delivery_follow_in_order() {
        let listeners = Arc::new(Listeners::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = listeners.clone();
        let sink = seen.clone();
        listeners.add(Arc::new(move |event| {
            let count = count_of(event);
            sink.lock().unwrap().push(count);
            if count == 1 {
                // Re-entrant publish from inside a callback.
                inner.emit(changed(2));
            }
        }));

        listeners.emit(changed(1));
        listeners.emit(changed(3));

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn panicking_listener_does_not_wedge_delivery() {
        let listeners = Listeners::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        listeners.add(Arc::new(move |event| {
            let count = count_of(event);
            if count == 0 {
                panic!("listener failed");
            }
            sink.lock().unwrap().push(count);
        }));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            listeners.emit(changed(0))
        }));
        assert!(result.is_err());

        listeners.emit(changed(4));
        assert_eq!(*seen.lock().unwrap(), vec![4]);
    }
}
