use indexmap::IndexSet;

use crate::binary_heap_cus::{BinHeap, SparseLocator};

const NONE: usize = usize::MAX;

/// Take a class id from the free list, or append a new one.
fn alloc_class<C>(classes: &mut Vec<C>, free: &mut Vec<usize>, class: C) -> usize {
    match free.pop() {
        Some(id) => {
            classes[id] = class;
            id
        }
        None => {
            classes.push(class);
            classes.len() - 1
        }
    }
}

/// Disjoint sets over dense item ids with enumerable classes. Joining moves the members
/// of the smaller class into the larger one, so `find` is a single lookup.
#[derive(Default)]
pub struct UnionFindEnum {
    class_of: Vec<usize>,
    classes: Vec<Vec<usize>>,
    free: Vec<usize>,
}

impl UnionFindEnum {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.class_of.clear();
        self.classes.clear();
        self.free.clear();
    }

    /// put item into a new singleton class
    pub fn insert(&mut self, item: usize) -> usize {
        if item >= self.class_of.len() {
            self.class_of.resize(item + 1, NONE);
        }
        debug_assert_eq!(self.class_of[item], NONE);

        let class = alloc_class(&mut self.classes, &mut self.free, vec![item]);
        self.class_of[item] = class;
        class
    }

    /// put item into an existing class
    pub fn insert_into(&mut self, item: usize, class: usize) {
        if item >= self.class_of.len() {
            self.class_of.resize(item + 1, NONE);
        }
        debug_assert_eq!(self.class_of[item], NONE);

        self.class_of[item] = class;
        self.classes[class].push(item);
    }

    pub fn contains(&self, item: usize) -> bool {
        self.class_of.get(item).map_or(false, |&c| c != NONE)
    }

    pub fn find(&self, item: usize) -> usize {
        self.class_of[item]
    }

    /// merge the classes of two items, return the surviving class
    pub fn join(&mut self, a: usize, b: usize) -> usize {
        let (mut ca, mut cb) = (self.class_of[a], self.class_of[b]);
        if ca == cb {
            return ca;
        }
        if self.classes[ca].len() < self.classes[cb].len() {
            std::mem::swap(&mut ca, &mut cb);
        }

        let moved = std::mem::take(&mut self.classes[cb]);
        for &item in &moved {
            self.class_of[item] = ca;
        }
        self.classes[ca].extend(moved);
        self.free.push(cb);
        ca
    }

    pub fn items(&self, class: usize) -> &[usize] {
        &self.classes[class]
    }

    pub fn size(&self, class: usize) -> usize {
        self.classes[class].len()
    }

    /// remove the class and all its items
    pub fn erase_class(&mut self, class: usize) {
        for item in std::mem::take(&mut self.classes[class]) {
            self.class_of[item] = NONE;
        }
        self.free.push(class);
    }
}

/// Disjoint sets which support removing a single item. Used to group the blossoms of
/// one alternating tree, every tree is a class.
#[derive(Default)]
pub struct ExtendFindEnum {
    class_of: Vec<usize>,
    classes: Vec<IndexSet<usize>>,
    free: Vec<usize>,
}

impl ExtendFindEnum {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.class_of.clear();
        self.classes.clear();
        self.free.clear();
    }

    fn bind(&mut self, item: usize, class: usize) {
        if item >= self.class_of.len() {
            self.class_of.resize(item + 1, NONE);
        }
        debug_assert_eq!(self.class_of[item], NONE);
        self.class_of[item] = class;
    }

    /// put item into a new class, return the class id
    pub fn insert(&mut self, item: usize) -> usize {
        let class = alloc_class(
            &mut self.classes,
            &mut self.free,
            IndexSet::from([item]),
        );
        self.bind(item, class);
        class
    }

    /// put item into an existing class
    pub fn insert_into(&mut self, item: usize, class: usize) {
        self.bind(item, class);
        self.classes[class].insert(item);
    }

    pub fn find(&self, item: usize) -> Option<usize> {
        self.class_of.get(item).copied().filter(|&c| c != NONE)
    }

    /// remove a single item, the class stays alive even if it gets empty
    pub fn erase(&mut self, item: usize) {
        if let Some(class) = self.find(item) {
            self.class_of[item] = NONE;
            self.classes[class].swap_remove(&item);
        }
    }

    pub fn erase_class(&mut self, class: usize) {
        for item in std::mem::take(&mut self.classes[class]) {
            self.class_of[item] = NONE;
        }
        self.free.push(class);
    }

    pub fn items(&self, class: usize) -> impl Iterator<Item = usize> + '_ {
        self.classes[class].iter().copied()
    }

    pub fn size(&self, class: usize) -> usize {
        self.classes[class].len()
    }
}

struct HeapClass<P> {
    parent: usize,
    /// sub-classes in the order they were joined, empty for a singleton
    children: Vec<usize>,
    item: usize,
    /// the items of a top-level class keyed by their priority
    heap: BinHeap<P, SparseLocator>,
    live: bool,
}

impl<P: PartialOrd + Copy> HeapClass<P> {
    fn new(item: usize) -> Self {
        HeapClass {
            parent: NONE,
            children: Vec::new(),
            item,
            heap: BinHeap::new(),
            live: true,
        }
    }
}

/// Nested partition of items, every item carries a priority and the minimum of each
/// top-level class could be queried. Classes are joined from an ordered list of top-level
/// classes and split back into exactly that list.
pub struct HeapUnionFind<P> {
    classes: Vec<HeapClass<P>>,
    free: Vec<usize>,
    top: Vec<usize>,
    prio: Vec<Option<P>>,
}

impl<P: PartialOrd + Copy> Default for HeapUnionFind<P> {
    fn default() -> Self {
        HeapUnionFind {
            classes: Vec::new(),
            free: Vec::new(),
            top: Vec::new(),
            prio: Vec::new(),
        }
    }
}

impl<P: PartialOrd + Copy> HeapUnionFind<P> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.classes.clear();
        self.free.clear();
        self.top.clear();
        self.prio.clear();
    }

    /// upper bound of every class id handed out so far
    pub fn class_bound(&self) -> usize {
        self.classes.len()
    }

    /// put item into a new singleton class with the given priority
    pub fn insert(&mut self, item: usize, prio: P) -> usize {
        if item >= self.top.len() {
            self.top.resize(item + 1, NONE);
            self.prio.resize(item + 1, None);
        }

        let mut class = HeapClass::new(item);
        class.heap.push(item, prio);
        let class = alloc_class(&mut self.classes, &mut self.free, class);
        self.top[item] = class;
        self.prio[item] = Some(prio);
        class
    }

    /// the top-level class of item
    pub fn find(&self, item: usize) -> usize {
        self.top[item]
    }

    pub fn trivial(&self, class: usize) -> bool {
        self.classes[class].children.is_empty()
    }

    /// all items of class, in the nesting order of its sub-classes
    pub fn items(&self, class: usize) -> Vec<usize> {
        let mut items = Vec::new();
        let mut stack = vec![class];
        while let Some(c) = stack.pop() {
            let c = &self.classes[c];
            if c.children.is_empty() {
                items.push(c.item);
            } else {
                stack.extend(c.children.iter().rev());
            }
        }
        items
    }

    /// the live top-level classes
    pub fn classes(&self) -> Vec<usize> {
        (0..self.classes.len())
            .filter(|&c| self.classes[c].live && self.classes[c].parent == NONE)
            .collect()
    }

    /// join top-level classes into a new class, return its id
    pub fn join(&mut self, subclasses: &[usize]) -> usize {
        let mut class = HeapClass::new(NONE);
        class.children = subclasses.to_vec();
        for &sub in subclasses {
            debug_assert_eq!(self.classes[sub].parent, NONE);
            let heap = std::mem::take(&mut self.classes[sub].heap);
            for (item, prio) in heap.iter() {
                class.heap.push(item, prio);
            }
        }

        let id = alloc_class(&mut self.classes, &mut self.free, class);
        for &sub in subclasses {
            self.classes[sub].parent = id;
        }
        for item in self.items(id) {
            self.top[item] = id;
        }
        id
    }

    /// split a top-level class into the classes it was joined from, the class id is
    /// released
    pub fn split(&mut self, class: usize) -> Vec<usize> {
        let children = std::mem::take(&mut self.classes[class].children);
        for &sub in &children {
            self.classes[sub].parent = NONE;
            let mut heap = BinHeap::new();
            for item in self.items(sub) {
                self.top[item] = sub;
                if let Some(prio) = self.prio[item] {
                    heap.push(item, prio);
                }
            }
            self.classes[sub].heap = heap;
        }

        self.classes[class].heap.clear();
        self.classes[class].live = false;
        self.free.push(class);
        children
    }

    pub fn item_prio(&self, item: usize) -> Option<P> {
        self.prio[item]
    }

    /// minimum priority of the class
    pub fn class_prio(&self, class: usize) -> Option<P> {
        self.classes[class].heap.prio()
    }

    /// the item with minimum priority of the class
    pub fn class_top(&self, class: usize) -> Option<usize> {
        self.classes[class].heap.top()
    }

    pub fn decrease(&mut self, item: usize, prio: P) {
        self.prio[item] = Some(prio);
        let class = self.top[item];
        self.classes[class].heap.decrease(item, prio);
    }

    pub fn increase(&mut self, item: usize, prio: P) {
        self.prio[item] = Some(prio);
        let class = self.top[item];
        self.classes[class].heap.increase(item, prio);
    }
}
