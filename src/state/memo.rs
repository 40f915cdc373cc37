/// A derived value cached against the key of the inputs it came from.
///
/// Owners bump a revision whenever a real input changes and read through
/// [`Memo::get_or_compute`] with the current key; the value is only
/// recomputed when the key moved.
#[derive(Debug, Clone)]
pub struct Memo<K, T> {
    cached: Option<(K, T)>,
    computations: u64,
}

impl<K, T> Default for Memo<K, T> {
    fn default() -> Self {
        Self {
            cached: None,
            computations: 0,
        }
    }
}

impl<K: PartialEq + Copy, T: Clone> Memo<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> T) -> T {
        match &self.cached {
            Some((cached_key, value)) if *cached_key == key => value.clone(),
            _ => {
                let value = compute();
                self.computations += 1;
                self.cached = Some((key, value.clone()));
                value
            }
        }
    }

    /// The cached value, if it was computed for `key`.
    pub fn get(&self, key: K) -> Option<&T> {
        self.cached
            .as_ref()
            .filter(|(cached_key, _)| *cached_key == key)
            .map(|(_, value)| value)
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// How many times the value has been computed.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recomputes_only_on_new_key() {
        let mut memo: Memo<u64, String> = Memo::new();
        assert_eq!(memo.get_or_compute(1, || "a".to_string()), "a");
        assert_eq!(memo.get_or_compute(1, || "b".to_string()), "a");
        assert_eq!(memo.computations(), 1);
        assert_eq!(memo.get_or_compute(2, || "c".to_string()), "c");
        assert_eq!(memo.computations(), 2);
        assert!(memo.get(1).is_none());
        assert_eq!(memo.get(2).map(String::as_str), Some("c"));
        memo.invalidate();
        assert!(memo.get(2).is_none());
    }
}
