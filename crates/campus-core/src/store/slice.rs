// ── Per-resource state slice ──
//
// One slice mirrors one server collection. Every request moves it through
// pending -> fulfilled | rejected. Item mutations always apply when a
// request succeeds; `loading` and `error` belong to the most recently
// dispatched request only.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use campus_api::{EntityId, Pagination, Resource};
use serde::Serialize;
use tokio::sync::watch;
use tracing::trace;

use crate::error::SliceError;
use crate::stream::SliceStream;

/// Snapshot of one resource collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceState<T> {
    /// Server order; never re-sorted locally.
    pub items: Vec<T>,
    pub selected: Option<T>,
    pub loading: bool,
    pub error: Option<SliceError>,
    pub pagination: Option<Pagination>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            loading: false,
            error: None,
            pagination: None,
        }
    }
}

impl<T: Resource> ResourceState<T> {
    pub fn find(&self, id: &EntityId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }
}

/// Data change carried by a fulfilled request.
#[derive(Debug, Clone)]
pub enum Mutation<T> {
    /// A full list fetch.
    ReplaceAll {
        items: Vec<T>,
        pagination: Option<Pagination>,
    },
    /// A created entity, pushed to the end.
    Append(T),
    /// An updated entity, spliced in place of the one with the same id.
    Replace(T),
    /// A deleted entity.
    Remove(EntityId),
    /// A single fetched entity becomes the selection.
    Select(T),
}

/// Proof that a request was dispatched; settles it exactly once.
///
/// A ticket dropped before it is fulfilled or rejected (the request
/// future was cancelled) is abandoned, so `loading` never outlives the
/// request that set it.
#[must_use = "a dispatched request must be fulfilled, rejected or abandoned"]
pub struct RequestTicket<'a, T: Resource> {
    slice: &'a Slice<T>,
    generation: u64,
    armed: bool,
}

impl<T: Resource> RequestTicket<'_, T> {
    /// Hand the generation to a settling transition; the drop no longer
    /// abandons.
    fn disarm(mut self) -> u64 {
        self.armed = false;
        self.generation
    }
}

impl<T: Resource> Drop for RequestTicket<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            trace!(kind = %T::KIND, generation = self.generation, "request dropped unsettled");
            self.slice.settle_quietly(self.generation);
        }
    }
}

impl<T: Resource> std::fmt::Debug for RequestTicket<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestTicket")
            .field("kind", &T::KIND)
            .field("generation", &self.generation)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

/// Reactive container for one resource kind.
pub struct Slice<T: Resource> {
    state: watch::Sender<Arc<ResourceState<T>>>,
    /// Generation of the most recently dispatched request.
    latest: AtomicU64,
}

impl<T: Resource> Default for Slice<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> Slice<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(ResourceState::default()));
        Self {
            state,
            latest: AtomicU64::new(0),
        }
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<ResourceState<T>> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> SliceStream<T> {
        SliceStream::new(self.state.subscribe())
    }

    // ── Request lifecycle ────────────────────────────────────────────

    /// `pending`: start tracking a new request.
    pub fn pending(&self) -> RequestTicket<'_, T> {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            let next = Arc::make_mut(state);
            next.loading = true;
            next.error = None;
        });
        trace!(kind = %T::KIND, generation, "request pending");
        RequestTicket {
            slice: self,
            generation,
            armed: true,
        }
    }

    /// `fulfilled`: apply the mutation; settle loading if still latest.
    pub fn fulfill(&self, ticket: RequestTicket<'_, T>, mutation: Mutation<T>) {
        let generation = ticket.disarm();
        self.state.send_modify(|state| {
            let latest = self.is_latest(generation);
            let next = Arc::make_mut(state);
            apply(next, mutation);
            if latest {
                next.loading = false;
            }
        });
        trace!(kind = %T::KIND, generation, "request fulfilled");
    }

    /// `rejected`: items stay as they were; the error is recorded only
    /// when no newer request has been dispatched since.
    pub fn reject(&self, ticket: RequestTicket<'_, T>, error: SliceError) {
        let generation = ticket.disarm();
        self.state.send_if_modified(|state| {
            if !self.is_latest(generation) {
                return false;
            }
            let next = Arc::make_mut(state);
            next.loading = false;
            next.error = Some(error);
            true
        });
        trace!(kind = %T::KIND, generation, "request rejected");
    }

    /// Settle a request without recording an error (the credential was
    /// rejected and the guard is handling it).
    pub fn abandon(&self, ticket: RequestTicket<'_, T>) {
        self.settle_quietly(ticket.disarm());
    }

    fn settle_quietly(&self, generation: u64) {
        self.state.send_if_modified(|state| {
            if !self.is_latest(generation) || !state.loading {
                return false;
            }
            Arc::make_mut(state).loading = false;
            true
        });
    }

    // ── Synchronous reducers ─────────────────────────────────────────

    pub fn select(&self, item: Option<T>) {
        self.state.send_modify(|state| Arc::make_mut(state).selected = item);
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| {
            if state.error.is_none() {
                return false;
            }
            Arc::make_mut(state).error = None;
            true
        });
    }

    /// Drop every cached item and settle any in-flight tracking.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.latest.fetch_add(1, Ordering::SeqCst);
            *state = Arc::new(ResourceState::default());
        });
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == generation
    }
}

fn apply<T: Resource>(state: &mut ResourceState<T>, mutation: Mutation<T>) {
    match mutation {
        Mutation::ReplaceAll { items, pagination } => {
            state.items = items;
            state.pagination = pagination;
        }
        Mutation::Append(item) => state.items.push(item),
        Mutation::Replace(item) => {
            if let Some(slot) = state.items.iter_mut().find(|x| x.id() == item.id()) {
                *slot = item.clone();
            }
            if let Some(selected) = state.selected.as_mut().filter(|s| s.id() == item.id()) {
                *selected = item;
            }
        }
        Mutation::Remove(id) => {
            state.items.retain(|x| x.id() != &id);
            if state.selected.as_ref().is_some_and(|s| s.id() == &id) {
                state.selected = None;
            }
        }
        Mutation::Select(item) => state.selected = Some(item),
    }
}
