use super::tracker::{TrackId, TrackState};
use log::{debug, warn};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Slot {
    state: TrackState,
    last_seen: u64,
}

/// Per-track state storage with optional capacity.
///
/// When full, inserting a new id evicts the least recently observed track,
/// idle tracks first.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrackArena {
    slots: HashMap<TrackId, Slot>,
    capacity: Option<usize>,
    tick: u64,
}

impl TrackArena {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            slots: HashMap::new(),
            capacity: capacity.map(|c| c.max(1)),
            tick: 0,
        }
    }

    pub(crate) fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub(crate) fn get(&self, id: TrackId) -> Option<&TrackState> {
        self.slots.get(&id).map(|s| &s.state)
    }

    /// State for `id`, created `Idle` if unknown; marks it most recently used.
    pub(crate) fn touch(&mut self, id: TrackId) -> &mut TrackState {
        self.tick += 1;
        if !self.slots.contains_key(&id) {
            if let Some(cap) = self.capacity {
                if self.slots.len() >= cap {
                    self.evict_one();
                }
            }
        }
        let tick = self.tick;
        let slot = self.slots.entry(id).or_insert_with(|| Slot {
            state: TrackState::default(),
            last_seen: tick,
        });
        slot.last_seen = tick;
        &mut slot.state
    }

    fn evict_one(&mut self) {
        let victim = self
            .slots
            .iter()
            .min_by_key(|(_, s)| (s.state.active, s.last_seen))
            .map(|(&id, s)| (id, s.state.active));
        if let Some((id, active)) = victim {
            self.slots.remove(&id);
            if active {
                warn!("track arena full, dropping in-zone track {id}; its crossing is lost");
            } else {
                debug!("track arena full, evicting idle track {id}");
            }
        }
    }

    pub(crate) fn ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<_> = self.slots.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_arena_keeps_everything() {
        let mut arena = TrackArena::new(None);
        for id in 0..1000 {
            arena.touch(id);
        }
        assert_eq!(arena.len(), 1000);
    }

    #[test]
    fn full_arena_evicts_least_recent_idle_track() {
        let mut arena = TrackArena::new(Some(3));
        arena.touch(1).active = true;
        arena.touch(2);
        arena.touch(3);
        arena.touch(2);

        arena.touch(4);
        assert_eq!(arena.ids(), vec![1, 2, 4]);
    }

    #[test]
    fn in_zone_tracks_go_last() {
        let mut arena = TrackArena::new(Some(2));
        arena.touch(1).active = true;
        arena.touch(2).active = true;
        arena.touch(1);

        arena.touch(3);
        assert_eq!(arena.ids(), vec![1, 3]);
    }

    #[test]
    fn known_ids_never_evict() {
        let mut arena = TrackArena::new(Some(2));
        arena.touch(1);
        arena.touch(2);
        arena.touch(1);
        arena.touch(2);
        assert_eq!(arena.ids(), vec![1, 2]);
    }
}
