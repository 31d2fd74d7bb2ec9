use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{BoCode, BoFragment};

/// Accumulator at the fan-out join point. Fragments land keyed by objective,
/// and applying one never disturbs sibling entries, so the result is the
/// same whichever scorer finishes first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultMap {
    results: BTreeMap<BoCode, BoFragment>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one scorer's fragment. Re-applying an identical fragment is
    /// idempotent; a later fragment for the same code replaces only that
    /// code's entry.
    pub fn merge_fragment(&mut self, code: BoCode, fragment: BoFragment) {
        self.results.insert(code, fragment);
    }

    /// Union with another partial map, entry by entry. Absorbing an empty
    /// map is a no-op.
    pub fn absorb(&mut self, other: ResultMap) {
        for (code, fragment) in other.results {
            self.merge_fragment(code, fragment);
        }
    }

    pub fn get(&self, code: BoCode) -> Option<&BoFragment> {
        self.results.get(&code)
    }

    pub fn codes(&self) -> Vec<BoCode> {
        self.results.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BoCode, &BoFragment)> {
        self.results.iter()
    }

    pub(crate) fn into_inner(self) -> BTreeMap<BoCode, BoFragment> {
        self.results
    }
}

impl FromIterator<(BoCode, BoFragment)> for ResultMap {
    fn from_iter<I: IntoIterator<Item = (BoCode, BoFragment)>>(iter: I) -> Self {
        let mut map = ResultMap::new();
        for (code, fragment) in iter {
            map.merge_fragment(code, fragment);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments() -> Vec<(BoCode, BoFragment)> {
        BoCode::ordered()
            .into_iter()
            .enumerate()
            .map(|(idx, code)| {
                (
                    code,
                    BoFragment::new(0.2 * idx as f64).with_factor("probe", idx as f64),
                )
            })
            .collect()
    }

    #[test]
    fn merge_order_does_not_change_the_result() {
        let baseline: ResultMap = fragments().into_iter().collect();

        let mut rotations = Vec::new();
        for shift in 0..fragments().len() {
            let mut rotated = fragments();
            rotated.rotate_left(shift);
            rotations.push(rotated);
        }
        let mut reversed = fragments();
        reversed.reverse();
        rotations.push(reversed);

        for ordering in rotations {
            let merged: ResultMap = ordering.into_iter().collect();
            assert_eq!(merged, baseline);
        }
    }

    #[test]
    fn fragments_never_clobber_sibling_entries() {
        let mut map = ResultMap::new();
        map.merge_fragment(BoCode::Bo1, BoFragment::new(0.9));
        map.merge_fragment(BoCode::Bo2, BoFragment::new(0.4));

        map.merge_fragment(BoCode::Bo2, BoFragment::new(0.5));
        assert_eq!(map.get(BoCode::Bo1).expect("BO1 kept").ratio, 0.9);
        assert_eq!(map.get(BoCode::Bo2).expect("BO2 replaced").ratio, 0.5);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn absorbing_an_empty_map_is_a_no_op() {
        let mut map: ResultMap = fragments().into_iter().collect();
        let before = map.clone();
        map.absorb(ResultMap::new());
        assert_eq!(map, before);
    }

    #[test]
    fn repeated_identical_fragments_are_idempotent() {
        let mut once = ResultMap::new();
        once.merge_fragment(BoCode::Bo3, BoFragment::new(1.2));

        let mut twice = ResultMap::new();
        twice.merge_fragment(BoCode::Bo3, BoFragment::new(1.2));
        twice.merge_fragment(BoCode::Bo3, BoFragment::new(1.2));

        assert_eq!(once, twice);
    }
}
