//! Run-length encoded sequences.
//!
//! `RunArray<T>` stores a logical sequence of `len` elements as `(count, value)` runs.
//! Adjacent runs never hold equal values, so a sequence of N identical elements costs one run.
//! Indices are 0-based.

use crate::Coordinate;

/// One run of identical values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run<T> {
    /// Number of elements in the run (never 0).
    pub len: usize,
    /// The shared value.
    pub value: T,
}

/// A run-length encoded sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArray<T> {
    runs: Vec<Run<T>>,
    len: usize,
}

impl<T> Default for RunArray<T> {
    fn default() -> Self {
        Self {
            runs: Vec::new(),
            len: 0,
        }
    }
}

impl<T: Clone + PartialEq> RunArray<T> {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequence of `count` copies of `value`.
    pub fn with_run(value: T, count: usize) -> Self {
        let mut array = Self::new();
        array.push_run(value, count);
        array
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of runs.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Iterate over the runs in order.
    pub fn runs(&self) -> impl Iterator<Item = &Run<T>> {
        self.runs.iter()
    }

    /// Iterate over every element, expanding runs.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.runs
            .iter()
            .flat_map(|run| std::iter::repeat_n(&run.value, run.len))
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.runs.clear();
        self.len = 0;
    }

    /// Find the run holding `index`: `(run index, offset within run)`.
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.len {
            return None;
        }
        let mut first = 0;
        for (i, run) in self.runs.iter().enumerate() {
            if index < first + run.len {
                return Some((i, index - first));
            }
            first += run.len;
        }
        None
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.locate(index).map(|(run, _)| &self.runs[run].value)
    }

    /// Append `count` copies of `value`.
    pub fn push_run(&mut self, value: T, count: usize) {
        self.insert_run(self.len, value, count);
    }

    /// Append one element.
    pub fn push(&mut self, value: T) {
        self.push_run(value, 1);
    }

    /// Insert one element before `index`.
    pub fn insert(&mut self, index: usize, value: T) {
        self.insert_run(index, value, 1);
    }

    /// Insert `count` copies of `value` before `index` (`index <= len`).
    pub fn insert_run(&mut self, index: usize, value: T, count: usize) {
        assert!(index <= self.len, "insert index {index} beyond len {}", self.len);
        if count == 0 {
            return;
        }
        self.len += count;

        if index == self.len - count {
            match self.runs.last_mut() {
                Some(last) if last.value == value => last.len += count,
                _ => self.runs.push(Run { len: count, value }),
            }
            return;
        }

        let Some((run, offset)) = self.locate_with_len(index, self.len - count) else {
            return;
        };
        if self.runs[run].value == value {
            self.runs[run].len += count;
        } else if offset == 0 {
            if run > 0 && self.runs[run - 1].value == value {
                self.runs[run - 1].len += count;
            } else {
                self.runs.insert(run, Run { len: count, value });
            }
        } else {
            let tail = Run {
                len: self.runs[run].len - offset,
                value: self.runs[run].value.clone(),
            };
            self.runs[run].len = offset;
            self.runs.insert(run + 1, Run { len: count, value });
            self.runs.insert(run + 2, tail);
        }
    }

    /// Insert every element of `other` before `index`.
    pub fn insert_array(&mut self, index: usize, other: &RunArray<T>) {
        let mut at = index;
        for run in &other.runs {
            self.insert_run(at, run.value.clone(), run.len);
            at += run.len;
        }
    }

    /// Remove the element at `index`.
    pub fn remove(&mut self, index: usize) {
        self.remove_range(index, 1);
    }

    /// Remove `count` elements starting at `index`.
    pub fn remove_range(&mut self, index: usize, count: usize) {
        assert!(
            index + count <= self.len,
            "remove range {index}+{count} beyond len {}",
            self.len
        );
        let mut remaining = count;
        while remaining > 0 {
            let Some((run, offset)) = self.locate(index) else {
                break;
            };
            let take = remaining.min(self.runs[run].len - offset);
            self.runs[run].len -= take;
            self.len -= take;
            remaining -= take;
            if self.runs[run].len == 0 {
                self.runs.remove(run);
            }
        }
        self.merge_at(index);
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, value: T) {
        self.set_run(index, 1, value);
    }

    /// Replace `count` elements starting at `index` with copies of `value`.
    pub fn set_run(&mut self, index: usize, count: usize, value: T) {
        if count == 1 && self.get(index) == Some(&value) {
            return;
        }
        self.remove_range(index, count);
        self.insert_run(index, value, count);
    }

    /// Copy `count` elements starting at `index`.
    pub fn slice(&self, index: usize, count: usize) -> RunArray<T> {
        let mut out = RunArray::new();
        for (_, len, value) in self.runs_from(index) {
            let taken = out.len();
            if taken >= count {
                break;
            }
            out.push_run(value.clone(), len.min(count - taken));
        }
        out
    }

    /// Iterate `(first index, len, value)` for runs from `index` on, the first clipped to start at `index`.
    pub fn runs_from(&self, index: usize) -> impl Iterator<Item = (usize, usize, &T)> {
        let mut first = 0;
        self.runs.iter().filter_map(move |run| {
            let run_first = first;
            first += run.len;
            let run_end = first;
            if run_end <= index {
                None
            } else if run_first >= index {
                Some((run_first, run.len, &run.value))
            } else {
                Some((index, run_end - index, &run.value))
            }
        })
    }

    /// Sum of `f(value)` over elements `[0, index)`.
    pub fn prefix_sum(&self, index: usize, f: impl Fn(&T) -> Coordinate) -> Coordinate {
        let mut sum = 0;
        let mut remaining = index.min(self.len);
        for run in &self.runs {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(run.len);
            sum += f(&run.value) * take as Coordinate;
            remaining -= take;
        }
        sum
    }

    /// Sum of `f(value)` over every element.
    pub fn total(&self, f: impl Fn(&T) -> Coordinate) -> Coordinate {
        self.prefix_sum(self.len, f)
    }

    /// Find the element whose running-sum span contains `target`.
    ///
    /// `f` must be positive. Returns `(index, sum of the elements before it)`, or `None` when
    /// `target` lies outside `[0, total)`.
    pub fn find_positive_sum(
        &self,
        target: Coordinate,
        f: impl Fn(&T) -> Coordinate,
    ) -> Option<(usize, Coordinate)> {
        if target < 0 {
            return None;
        }
        let mut sum = 0;
        let mut index = 0;
        for run in &self.runs {
            let step = f(&run.value);
            debug_assert!(step > 0);
            let span = step * run.len as Coordinate;
            if target < sum + span {
                let k = ((target - sum) / step) as usize;
                return Some((index + k, sum + step * k as Coordinate));
            }
            sum += span;
            index += run.len;
        }
        None
    }

    fn locate_with_len(&self, index: usize, len: usize) -> Option<(usize, usize)> {
        if index >= len {
            return None;
        }
        let mut first = 0;
        for (i, run) in self.runs.iter().enumerate() {
            if index < first + run.len {
                return Some((i, index - first));
            }
            first += run.len;
        }
        None
    }

    fn merge_at(&mut self, index: usize) {
        if let Some((run, 0)) = self.locate(index)
            && run > 0
            && self.runs[run - 1].value == self.runs[run].value
        {
            let len = self.runs[run].len;
            self.runs[run - 1].len += len;
            self.runs.remove(run);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(a: &RunArray<u8>) -> Vec<u8> {
        a.iter().copied().collect()
    }

    #[test]
    fn identical_values_share_one_run() {
        let mut a = RunArray::new();
        for _ in 0..1000 {
            a.push(7u8);
        }
        assert_eq!(a.len(), 1000);
        assert_eq!(a.run_count(), 1);
    }

    #[test]
    fn insert_splits_and_merges() {
        let mut a = RunArray::with_run(1u8, 4);
        a.insert(2, 2);
        assert_eq!(values(&a), vec![1, 1, 2, 1, 1]);
        assert_eq!(a.run_count(), 3);
        a.remove(2);
        assert_eq!(values(&a), vec![1, 1, 1, 1]);
        assert_eq!(a.run_count(), 1);
    }

    #[test]
    fn insert_at_run_boundary_joins_previous() {
        let mut a = RunArray::new();
        a.push_run(1u8, 2);
        a.push_run(2u8, 2);
        a.insert(2, 1);
        assert_eq!(values(&a), vec![1, 1, 1, 2, 2]);
        assert_eq!(a.run_count(), 2);
    }

    #[test]
    fn remove_range_across_runs() {
        let mut a = RunArray::new();
        a.push_run(1u8, 3);
        a.push_run(2u8, 3);
        a.push_run(1u8, 3);
        a.remove_range(2, 5);
        assert_eq!(values(&a), vec![1, 1, 1, 1]);
        assert_eq!(a.run_count(), 1);
    }

    #[test]
    fn set_replaces_single_element() {
        let mut a = RunArray::with_run(0u8, 3);
        a.set(1, 5);
        assert_eq!(values(&a), vec![0, 5, 0]);
        a.set(1, 0);
        assert_eq!(a.run_count(), 1);
    }

    #[test]
    fn slice_and_insert_array() {
        let mut a = RunArray::new();
        a.push_run(1u8, 2);
        a.push_run(2u8, 3);
        let s = a.slice(1, 3);
        assert_eq!(values(&s), vec![1, 2, 2]);
        let mut b = RunArray::with_run(9u8, 2);
        b.insert_array(1, &s);
        assert_eq!(values(&b), vec![9, 1, 2, 2, 9]);
    }

    #[test]
    fn sums_and_positive_search() {
        let mut a = RunArray::new();
        a.push_run(10, 2);
        a.push_run(25, 1);
        a.push_run(10, 1);
        assert_eq!(a.prefix_sum(0, |v| *v), 0);
        assert_eq!(a.prefix_sum(3, |v| *v), 45);
        assert_eq!(a.total(|v| *v), 55);
        assert_eq!(a.find_positive_sum(0, |v| *v), Some((0, 0)));
        assert_eq!(a.find_positive_sum(19, |v| *v), Some((1, 10)));
        assert_eq!(a.find_positive_sum(20, |v| *v), Some((2, 20)));
        assert_eq!(a.find_positive_sum(54, |v| *v), Some((3, 45)));
        assert_eq!(a.find_positive_sum(55, |v| *v), None);
    }
}
