/*****************************************************************************************[heap.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use crate::intmap::{AsIndex, IntMap};
use std::{cmp, ops};

/// Priority order for heap elements; `lt` means "closer to the top".
pub trait Comparator<T: ?Sized> {
    fn cmp(&self, lhs: &T, rhs: &T) -> cmp::Ordering;
    #[inline]
    fn lt(&self, lhs: &T, rhs: &T) -> bool {
        self.cmp(lhs, rhs) == cmp::Ordering::Less
    }
}

/// Binary heap over integer-like keys, with a position index for O(log n)
/// priority updates.
///
/// The comparator is supplied at each use via [`HeapData::promote`], so the
/// ordering may depend on solver state (variable activities) without the heap
/// owning a borrow of it.
#[derive(Debug, Clone)]
pub struct HeapData<K: AsIndex> {
    heap: Vec<K>,
    indices: IntMap<K, i32>,
}

impl<K: AsIndex> Default for HeapData<K> {
    fn default() -> Self {
        Self {
            heap: Vec::new(),
            indices: IntMap::new(),
        }
    }
}

impl<K: AsIndex> HeapData<K> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn in_heap(&self, k: K) -> bool {
        self.indices.has(k) && self.indices[k] >= 0
    }

    /// Element currently at the top, without removing it.
    pub fn peek(&self) -> Option<K> {
        self.heap.first().copied()
    }

    pub fn promote<Comp: Comparator<K>>(&mut self, comp: Comp) -> Heap<K, Comp> {
        Heap { data: self, comp }
    }
}

impl<K: AsIndex> ops::Index<usize> for HeapData<K> {
    type Output = K;
    fn index(&self, index: usize) -> &Self::Output {
        &self.heap[index]
    }
}

/// A `HeapData` together with its ordering; this is the mutable view that
/// supports insertion and removal.
#[derive(Debug)]
pub struct Heap<'a, K: AsIndex, Comp: Comparator<K>> {
    data: &'a mut HeapData<K>,
    comp: Comp,
}

impl<'a, K: AsIndex, Comp: Comparator<K>> ops::Deref for Heap<'a, K, Comp> {
    type Target = HeapData<K>;
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
impl<'a, K: AsIndex, Comp: Comparator<K>> ops::DerefMut for Heap<'a, K, Comp> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<'a, K: AsIndex, Comp: Comparator<K>> Heap<'a, K, Comp> {
    fn percolate_up(&mut self, mut i: u32) {
        let x = self.heap[i as usize];
        let mut p = parent_index(i);

        while i != 0 && self.comp.lt(&x, &self.heap[p as usize]) {
            self.heap[i as usize] = self.heap[p as usize];
            let tmp = self.heap[p as usize];
            self.indices[tmp] = i as i32;
            i = p;
            p = parent_index(p);
        }
        self.heap[i as usize] = x;
        self.indices[x] = i as i32;
    }

    fn percolate_down(&mut self, mut i: u32) {
        let x = self.heap[i as usize];
        while (left_index(i) as usize) < self.heap.len() {
            let child = if (right_index(i) as usize) < self.heap.len()
                && self.comp.lt(
                    &self.heap[right_index(i) as usize],
                    &self.heap[left_index(i) as usize],
                ) {
                right_index(i)
            } else {
                left_index(i)
            };
            if !self.comp.lt(&self.heap[child as usize], &x) {
                break;
            }
            self.heap[i as usize] = self.heap[child as usize];
            let tmp = self.heap[i as usize];
            self.indices[tmp] = i as i32;
            i = child;
        }
        self.heap[i as usize] = x;
        self.indices[x] = i as i32;
    }

    /// Restore order after the priority of `k` moved toward the top.
    pub fn decrease(&mut self, k: K) {
        debug_assert!(self.in_heap(k));
        let k_index = self.indices[k];
        self.percolate_up(k_index as u32);
    }

    /// Safe variant of insert/decrease/increase.
    pub fn update(&mut self, k: K) {
        if !self.in_heap(k) {
            self.insert(k);
        } else {
            let k_index = self.indices[k];
            self.percolate_up(k_index as u32);
            let k_index = self.indices[k];
            self.percolate_down(k_index as u32);
        }
    }

    pub fn insert(&mut self, k: K) {
        self.indices.reserve(k, -1);
        debug_assert!(!self.in_heap(k));

        self.indices[k] = self.heap.len() as i32;
        self.heap.push(k);
        let k_index = self.indices[k];
        self.percolate_up(k_index as u32);
    }

    pub fn remove_min(&mut self) -> K {
        let x = *self.heap.first().expect("heap is empty");
        let lastval = *self.heap.last().expect("heap is empty");
        self.heap[0] = lastval;
        self.indices[lastval] = 0;
        self.indices[x] = -1;
        self.heap.pop().expect("cannot pop from empty heap");
        if self.heap.len() > 1 {
            self.percolate_down(0);
        }
        x
    }

    /// Rebuild the heap from scratch, using the elements in `ns`.
    pub fn build(&mut self, ns: &[K]) {
        {
            let data = &mut self.data;
            for &x in &data.heap {
                data.indices[x] = -1;
            }
        }
        self.heap.clear();

        for (i, &x) in ns.iter().enumerate() {
            self.indices.reserve(x, -1);
            self.indices[x] = i as i32;
            self.heap.push(x);
        }

        let mut i = self.heap.len() as i32 / 2 - 1;
        while i >= 0 {
            self.percolate_down(i as u32);
            i -= 1;
        }
    }
}

#[inline(always)]
fn left_index(i: u32) -> u32 {
    i * 2 + 1
}
#[inline(always)]
fn right_index(i: u32) -> u32 {
    (i + 1) * 2
}
#[inline(always)]
fn parent_index(i: u32) -> u32 {
    (i.wrapping_sub(1)) >> 1
}

#[cfg(test)]
mod test {
    use super::*;

    struct ByScore<'a>(&'a [f64]);

    impl<'a> Comparator<u32> for ByScore<'a> {
        fn cmp(&self, lhs: &u32, rhs: &u32) -> cmp::Ordering {
            // max-heap on score, ties by index
            PartialOrd::partial_cmp(&self.0[*rhs as usize], &self.0[*lhs as usize])
                .expect("NaN score")
                .then(lhs.cmp(rhs))
        }
    }

    #[test]
    fn test_pop_order() {
        let scores = [1.0, 5.0, 3.0, 5.0, 0.5];
        let mut data: HeapData<u32> = HeapData::new();
        {
            let mut h = data.promote(ByScore(&scores));
            for k in 0..5 {
                h.insert(k);
            }
        }
        let mut out = vec![];
        let mut h = data.promote(ByScore(&scores));
        while !h.is_empty() {
            out.push(h.remove_min());
        }
        // equal scores break ties by index
        assert_eq!(out, vec![1, 3, 2, 0, 4]);
    }

    #[test]
    fn test_update_after_score_change() {
        let mut scores = [1.0, 2.0, 3.0];
        let mut data: HeapData<u32> = HeapData::new();
        {
            let mut h = data.promote(ByScore(&scores));
            for k in 0..3 {
                h.insert(k);
            }
        }
        assert_eq!(data.peek(), Some(2));
        scores[0] = 10.0;
        let mut h = data.promote(ByScore(&scores));
        h.decrease(0);
        assert_eq!(h.peek(), Some(0));
    }

    #[test]
    fn test_build_resets_membership() {
        let scores = [1.0, 2.0, 3.0, 4.0];
        let mut data: HeapData<u32> = HeapData::new();
        {
            let mut h = data.promote(ByScore(&scores));
            for k in 0..4 {
                h.insert(k);
            }
            h.build(&[0, 2]);
        }
        assert!(data.in_heap(0));
        assert!(!data.in_heap(1));
        assert!(data.in_heap(2));
        assert!(!data.in_heap(3));
        assert_eq!(data.peek(), Some(2));
    }
}
