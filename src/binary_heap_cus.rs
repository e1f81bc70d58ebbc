use std::collections::HashMap;

/// Where a key currently stands with respect to a heap. A key that was popped or erased
/// is `PostHeap`, a key that was never pushed since the last `clear` is `PreHeap`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HeapState {
    PreHeap,
    InHeap(usize),
    PostHeap,
}

/// Maps a key to its state (and position) inside the heap array.
pub trait Locator: Default {
    fn state(&self, key: usize) -> HeapState;

    fn set_state(&mut self, key: usize, state: HeapState);

    fn clear(&mut self);
}

/// Locator for dense key spaces, e.g. node, edge or blossom ids.
#[derive(Default)]
pub struct DenseLocator {
    slots: Vec<HeapState>,
}

impl Locator for DenseLocator {
    fn state(&self, key: usize) -> HeapState {
        self.slots.get(key).copied().unwrap_or(HeapState::PreHeap)
    }

    fn set_state(&mut self, key: usize, state: HeapState) {
        if key >= self.slots.len() {
            self.slots.resize(key + 1, HeapState::PreHeap);
        }
        self.slots[key] = state;
    }

    fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Locator for heaps which only ever see a handful of keys out of a large key space,
/// e.g. the arcs incident to one node.
#[derive(Default)]
pub struct SparseLocator {
    slots: HashMap<usize, HeapState>,
}

impl Locator for SparseLocator {
    fn state(&self, key: usize) -> HeapState {
        self.slots.get(&key).copied().unwrap_or(HeapState::PreHeap)
    }

    fn set_state(&mut self, key: usize, state: HeapState) {
        self.slots.insert(key, state);
    }

    fn clear(&mut self) {
        self.slots.clear();
    }
}

/// A min priority queue implemention with binary-heap structure, where every item
/// is addressed by an `usize` key, so that its priority could be changed or the item
/// removed after insertion.
pub struct BinHeap<P, L: Locator = DenseLocator> {
    data: Vec<(usize, P)>,
    locator: L,
}

impl<P, L> Default for BinHeap<P, L>
where
    P: PartialOrd + Copy,
    L: Locator,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, L> BinHeap<P, L>
where
    P: PartialOrd + Copy,
    L: Locator,
{
    pub fn new() -> Self {
        BinHeap {
            data: Vec::new(),
            locator: L::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// drop all items, every key goes back to `PreHeap`
    pub fn clear(&mut self) {
        self.data.clear();
        self.locator.clear();
    }

    pub fn state(&self, key: usize) -> HeapState {
        self.locator.state(key)
    }

    pub fn contains(&self, key: usize) -> bool {
        matches!(self.locator.state(key), HeapState::InHeap(_))
    }

    /// the key with minimum priority
    pub fn top(&self) -> Option<usize> {
        self.data.first().map(|&(key, _)| key)
    }

    /// the minimum priority
    pub fn prio(&self) -> Option<P> {
        self.data.first().map(|&(_, prio)| prio)
    }

    pub fn peek(&self) -> Option<(usize, P)> {
        self.data.first().copied()
    }

    /// the priority of key, if it's in the heap
    pub fn get(&self, key: usize) -> Option<P> {
        match self.locator.state(key) {
            HeapState::InHeap(pos) => Some(self.data[pos].1),
            _ => None,
        }
    }

    pub fn push(&mut self, key: usize, prio: P) {
        debug_assert!(!self.contains(key), "key {key} is already in the heap");
        let pos = self.data.len();
        self.data.push((key, prio));
        self.locator.set_state(key, HeapState::InHeap(pos));
        self.heap_up(pos);
    }

    pub fn pop(&mut self) -> Option<(usize, P)> {
        let top = self.top()?;
        self.erase(top).map(|prio| (top, prio))
    }

    /// remove the key from heap, return its priority if it was in the heap
    pub fn erase(&mut self, key: usize) -> Option<P> {
        let HeapState::InHeap(pos) = self.locator.state(key) else {
            return None;
        };

        let (_, prio) = self.data.swap_remove(pos);
        self.locator.set_state(key, HeapState::PostHeap);
        if pos < self.data.len() {
            self.place(pos);
            let pos = self.heap_up(pos);
            self.heap_down(pos);
        }

        Some(prio)
    }

    /// insert the key, or move it to the new priority if it's already in the heap
    pub fn set(&mut self, key: usize, prio: P) {
        match self.locator.state(key) {
            HeapState::InHeap(pos) => {
                if prio < self.data[pos].1 {
                    self.decrease(key, prio);
                } else {
                    self.increase(key, prio);
                }
            }
            _ => self.push(key, prio),
        }
    }

    pub fn decrease(&mut self, key: usize, prio: P) {
        if let HeapState::InHeap(pos) = self.locator.state(key) {
            debug_assert!(!(self.data[pos].1 < prio));
            self.data[pos].1 = prio;
            self.heap_up(pos);
        }
    }

    pub fn increase(&mut self, key: usize, prio: P) {
        if let HeapState::InHeap(pos) = self.locator.state(key) {
            debug_assert!(!(prio < self.data[pos].1));
            self.data[pos].1 = prio;
            self.heap_down(pos);
        }
    }

    /// let `new_key` take over the place of `old_key`, the priority is kept
    pub fn replace(&mut self, old_key: usize, new_key: usize) {
        if old_key == new_key {
            return;
        }
        if let HeapState::InHeap(pos) = self.locator.state(old_key) {
            self.data[pos].0 = new_key;
            self.locator.set_state(new_key, HeapState::InHeap(pos));
            self.locator.set_state(old_key, HeapState::PostHeap);
        }
    }

    /// iterate the items in heap order, not in priority order
    pub fn iter(&self) -> impl Iterator<Item = (usize, P)> + '_ {
        self.data.iter().copied()
    }

    #[inline]
    fn place(&mut self, pos: usize) {
        let key = self.data[pos].0;
        self.locator.set_state(key, HeapState::InHeap(pos));
    }

    /// heap-up from a specified position, return the final position
    fn heap_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !(self.data[pos].1 < self.data[parent].1) {
                break;
            }

            self.data.swap(pos, parent);
            self.place(pos);
            pos = parent;
        }
        self.place(pos);
        pos
    }

    /// heap-down from a specified position, return the final position
    fn heap_down(&mut self, mut pos: usize) -> usize {
        let end = self.data.len();
        loop {
            let left = pos * 2 + 1;
            if left >= end {
                break;
            }

            // pick the smaller child
            let right = left + 1;
            let child = if right < end && self.data[right].1 < self.data[left].1 {
                right
            } else {
                left
            };

            if !(self.data[child].1 < self.data[pos].1) {
                break;
            }

            self.data.swap(pos, child);
            self.place(pos);
            pos = child;
        }
        self.place(pos);
        pos
    }
}
