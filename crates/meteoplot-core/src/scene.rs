//! Scene graph storage.
//!
//! Graphics live in an arena of generation-checked slots. A [`GraphicHandle`]
//! is the graphic's identity: renderer caches key on it, editing a graphic
//! through [`Scene::update`] keeps the handle and bumps its geometry version,
//! and removing a graphic retires the handle for good.

use std::fmt;

use crate::extent::Extent3D;
use crate::graphic::Graphic;

/// Stable identity of a graphic in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphicHandle {
    index: u32,
    generation: u32,
}

impl GraphicHandle {
    /// Slot index, dense from zero.
    #[must_use]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for GraphicHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Entry {
    graphic: Graphic,
    version: u64,
    /// Index into `Scene::order`.
    position: usize,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Ordered collection of graphics owned by a plot.
///
/// Removal leaves a hole in the draw order that is compacted away once
/// holes outnumber live graphics.
#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<Option<GraphicHandle>>,
    live: usize,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a graphic at the end of the draw order.
    pub fn add(&mut self, graphic: Graphic) -> GraphicHandle {
        let handle = self.allocate(graphic, self.order.len());
        self.order.push(Some(handle));
        handle
    }

    /// Inserts a graphic at a draw-order position (clamped to the end).
    pub fn insert(&mut self, position: usize, graphic: Graphic) -> GraphicHandle {
        self.compact();
        let position = position.min(self.order.len());
        let handle = self.allocate(graphic, position);
        self.order.insert(position, Some(handle));
        self.renumber(position + 1);
        handle
    }

    fn allocate(&mut self, graphic: Graphic, position: usize) -> GraphicHandle {
        self.live += 1;
        let entry = Entry {
            graphic,
            version: 0,
            position,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            GraphicHandle {
                index,
                generation: slot.generation,
            }
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            GraphicHandle { index, generation: 0 }
        }
    }

    fn entry(&self, handle: GraphicHandle) -> Option<&Entry> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.entry.as_ref())
    }

    /// Removes a graphic; its handle never resolves again.
    pub fn remove(&mut self, handle: GraphicHandle) -> Option<Graphic> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.order[entry.position] = None;
        self.live -= 1;
        if self.order.len() > 2 * self.live {
            self.compact();
        }
        Some(entry.graphic)
    }

    /// Removes everything, retiring all handles.
    pub fn clear(&mut self) {
        for handle in std::mem::take(&mut self.order).into_iter().flatten() {
            let slot = &mut self.slots[handle.index()];
            slot.entry = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(handle.index);
        }
        self.live = 0;
    }

    /// Drops removal holes from the draw order.
    fn compact(&mut self) {
        if self.order.len() == self.live {
            return;
        }
        self.order.retain(Option::is_some);
        self.renumber(0);
    }

    /// Refreshes stored positions from `start` on.
    fn renumber(&mut self, start: usize) {
        for (position, handle) in self.order.iter().enumerate().skip(start) {
            if let Some(entry) = handle.and_then(|h| self.slots[h.index()].entry.as_mut()) {
                entry.position = position;
            }
        }
    }

    #[must_use]
    pub fn contains(&self, handle: GraphicHandle) -> bool {
        self.entry(handle).is_some()
    }

    #[must_use]
    pub fn get(&self, handle: GraphicHandle) -> Option<&Graphic> {
        self.entry(handle).map(|e| &e.graphic)
    }

    /// Geometry version, bumped by every [`Scene::update`].
    #[must_use]
    pub fn version(&self, handle: GraphicHandle) -> Option<u64> {
        self.entry(handle).map(|e| e.version)
    }

    /// Edits a graphic in place, keeping its identity and marking it changed.
    pub fn update<R>(&mut self, handle: GraphicHandle, f: impl FnOnce(&mut Graphic) -> R) -> Option<R> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.as_mut()?;
        entry.version += 1;
        Some(f(&mut entry.graphic))
    }

    /// Graphics in draw order.
    pub fn iter(&self) -> impl Iterator<Item = (GraphicHandle, &Graphic)> + '_ {
        self.order
            .iter()
            .flatten()
            .filter_map(move |h| self.get(*h).map(|g| (*h, g)))
    }

    /// Handles in draw order.
    pub fn handles(&self) -> impl Iterator<Item = GraphicHandle> + '_ {
        self.order.iter().flatten().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Union of all graphic extents.
    #[must_use]
    pub fn extent(&self) -> Option<Extent3D> {
        self.iter()
            .filter_map(|(_, g)| g.extent())
            .reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphic::PointStyle;
    use glam::Vec3;

    fn pts(x: f32) -> Graphic {
        Graphic::points(vec![Vec3::new(x, 0.0, 0.0)], PointStyle::default())
    }

    #[test]
    fn test_add_get_remove() {
        let mut scene = Scene::new();
        let a = scene.add(pts(0.0));
        let b = scene.add(pts(1.0));
        assert_eq!(scene.len(), 2);
        assert!(scene.remove(a).is_some());
        assert!(scene.get(a).is_none());
        assert!(scene.remove(a).is_none());
        assert!(scene.contains(b));
        assert_eq!(scene.handles().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn test_reused_slot_has_new_generation() {
        let mut scene = Scene::new();
        let a = scene.add(pts(0.0));
        scene.remove(a);
        let c = scene.add(pts(2.0));
        assert_eq!(a.index(), c.index());
        assert_ne!(a, c);
        assert!(scene.get(a).is_none());
        assert!(scene.get(c).is_some());
    }

    #[test]
    fn test_update_bumps_version() {
        let mut scene = Scene::new();
        let a = scene.add(pts(0.0));
        assert_eq!(scene.version(a), Some(0));
        scene.update(a, |g| g.visible = false);
        assert_eq!(scene.version(a), Some(1));
        assert!(!scene.get(a).unwrap().visible);
    }

    #[test]
    fn test_insert_order_and_extent() {
        let mut scene = Scene::new();
        let a = scene.add(pts(0.0));
        let b = scene.insert(0, pts(10.0));
        let order: Vec<_> = scene.iter().map(|(h, _)| h).collect();
        assert_eq!(order, vec![b, a]);
        let e = scene.extent().unwrap();
        assert_eq!(e.max_x, 10.0);
        scene.clear();
        assert!(scene.is_empty());
        assert!(scene.get(b).is_none());
    }

    #[test]
    fn test_remove_keeps_draw_order() {
        let mut scene = Scene::new();
        let handles: Vec<_> = (0..10u8).map(|i| scene.add(pts(f32::from(i)))).collect();
        for h in handles.iter().step_by(3) {
            scene.remove(*h);
        }
        let kept: Vec<_> = handles.iter().copied().filter(|h| scene.contains(*h)).collect();
        assert_eq!(scene.handles().collect::<Vec<_>>(), kept);
        assert_eq!(scene.len(), 6);

        let front = scene.insert(1, pts(-1.0));
        let order: Vec<_> = scene.handles().collect();
        assert_eq!(order[1], front);
        assert_eq!(order.len(), 7);

        // Positions stay valid after the insert shifted everything.
        scene.remove(kept[5]);
        scene.remove(front);
        assert_eq!(scene.handles().collect::<Vec<_>>(), kept[..5].to_vec());
    }
}
