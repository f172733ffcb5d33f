//! Utility structs and methods
use std::cmp::Ordering::{Equal, Less};

/// Iterator of all unordered pairwise combinations of the inner slice
///
/// Each pair is returned once, in the order of the slice, and an
/// item is never paired with itself.
///
/// # Examples
/// ```
/// use pathmech::utils::Combinations;
///
/// let items = [1, 2, 3];
/// let mut c = Combinations::new(&items);
///
/// assert_eq!(c.next(), Some((&1, &2)));
/// assert_eq!(c.next(), Some((&1, &3)));
/// assert_eq!(c.next(), Some((&2, &3)));
/// assert!(c.next().is_none());
/// ```
pub struct Combinations<'a, T> {
    inner: &'a [T],
    idx1: usize,
    idx2: usize,
}

impl<'a, T> Combinations<'a, T> {
    /// Creates a new Combinations iterator
    pub fn new(inner: &'a [T]) -> Self {
        Self {
            inner,
            idx1: 0,
            idx2: 1,
        }
    }
}

impl<'a, T> Iterator for Combinations<'a, T> {
    type Item = (&'a T, &'a T);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match (
                self.idx1 < self.inner.len(),
                self.idx2.cmp(&self.inner.len()),
            ) {
                (true, Less) => {
                    self.idx2 += 1;
                    return Some((&self.inner[self.idx1], &self.inner[self.idx2 - 1]));
                }
                (true, Equal) => {
                    self.idx1 += 1;
                    self.idx2 = self.idx1 + 1;
                }
                _ => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.inner.len();
        if self.idx1 >= n {
            return (0, Some(0));
        }
        // pairs left in the current row plus all following rows
        let current = n.saturating_sub(self.idx2);
        let rest = n - self.idx1 - 1;
        let following = rest * rest.saturating_sub(1) / 2;
        (current + following, Some(current + following))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn combinations() {
        let a = vec![1, 2, 3, 4];
        let mut c = Combinations::new(&a);
        assert_eq!(c.size_hint(), (6, Some(6)));
        assert_eq!(c.next(), Some((&1, &2)));
        assert_eq!(c.next(), Some((&1, &3)));
        assert_eq!(c.next(), Some((&1, &4)));
        assert_eq!(c.size_hint(), (3, Some(3)));
        assert_eq!(c.next(), Some((&2, &3)));
        assert_eq!(c.next(), Some((&2, &4)));
        assert_eq!(c.next(), Some((&3, &4)));
        assert_eq!(c.next(), None);
    }

    #[test]
    fn combinations_empty() {
        let a: Vec<usize> = vec![];
        let mut c = Combinations::new(&a);
        assert_eq!(c.size_hint(), (0, Some(0)));
        assert_eq!(c.next(), None);
    }

    #[test]
    fn combinations_single() {
        let a = vec![1];
        let mut c = Combinations::new(&a);
        assert_eq!(c.next(), None);
    }

    #[test]
    fn combinations_two() {
        let a = vec![1, 2];
        let mut c = Combinations::new(&a);
        assert_eq!(c.next(), Some((&1, &2)));
        assert_eq!(c.next(), None);
    }

    #[test]
    fn combinations_count() {
        let a: Vec<usize> = (0..10).collect();
        assert_eq!(Combinations::new(&a).count(), 45);
    }
}
