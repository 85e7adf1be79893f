use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

/// Precomputed Boyer-Moore skip table for one literal pattern.
///
/// Built once per compiled literal and owned by whatever does the scanning,
/// so there is no shared mutable state between match attempts. Uses the
/// bad-character rule only: every element of the pattern except the last
/// maps to how far the scan window may shift when that element is aligned
/// with the window's end.
#[derive(Debug, Clone)]
pub struct SearchCache<T> {
    pattern: Vec<T>,
    skip: HashMap<T, usize>,
}

impl<T: Clone + Eq + Hash> SearchCache<T> {
    pub fn new(pattern: &[T]) -> SearchCache<T> {
        let len = pattern.len();
        let mut skip = HashMap::with_capacity(len.saturating_sub(1));
        if len > 0 {
            for (i, e) in pattern[..len - 1].iter().enumerate() {
                skip.insert(e.clone(), len - i - 1);
            }
        }
        SearchCache { pattern: pattern.to_vec(), skip }
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Start index of the first occurrence of the pattern at or after `from`.
    pub fn find(&self, input: &[T], from: usize) -> Option<usize> {
        let m = self.pattern.len();
        if m == 0 {
            return None;
        }
        // `pos` tracks the input element aligned with the pattern's last element.
        let mut pos = from + m - 1;
        while pos < input.len() {
            let start = pos + 1 - m;
            if input[start..=pos] == self.pattern[..] {
                return Some(start);
            }
            pos += self.skip.get(&input[pos]).copied().unwrap_or(m);
        }
        None
    }

    /// All non-overlapping occurrences at or after `from`, leftmost first.
    pub fn find_all(&self, input: &[T], from: usize) -> Vec<Range<usize>> {
        let mut result = Vec::new();
        let m = self.pattern.len();
        if m == 0 {
            return result;
        }
        let mut pos = from + m - 1;
        while pos < input.len() {
            let start = pos + 1 - m;
            if input[start..=pos] == self.pattern[..] {
                result.push(start..pos + 1);
                pos += m;
            } else {
                pos += self.skip.get(&input[pos]).copied().unwrap_or(m);
            }
        }
        result
    }
}
