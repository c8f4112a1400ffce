use std::collections::HashSet;

use rand::Rng;
use rand::seq::index;

use crate::errors::GeneratorError;
use crate::types::PoolIndex;

/// Disjoint index groups drawn from one pool: an ordered list of demonstration
/// groups plus the query group the record's questions come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSelection {
    /// Demonstration groups, each `group_size` indices, in sampled order.
    pub demo_groups: Vec<Vec<PoolIndex>>,
    /// Query indices, `group_size` of them, drawn from the leftover pool.
    pub query_group: Vec<PoolIndex>,
}

/// Sample `num_demo_groups + 1` disjoint groups of `group_size` indices from
/// `0..pool_size`.
///
/// Demonstration indices are drawn first in one pass without replacement and
/// split into contiguous groups in their sampled order, then the query group
/// is drawn from the indices that remain. Groups are disjoint but individual
/// groups are not sorted; sampled order is part of the output.
pub fn select_groups<R: Rng + ?Sized>(
    pool_size: usize,
    group_size: usize,
    num_demo_groups: usize,
    rng: &mut R,
) -> Result<GroupSelection, GeneratorError> {
    if group_size == 0 {
        return Err(GeneratorError::Configuration(
            "group size must be positive".to_string(),
        ));
    }
    let demo_total = group_size
        .checked_mul(num_demo_groups)
        .ok_or_else(|| GeneratorError::Configuration("group demand overflows".to_string()))?;
    let required = demo_total + group_size;
    if pool_size < required {
        return Err(GeneratorError::InsufficientPoolSize {
            pool_size,
            required,
            num_groups: num_demo_groups + 1,
            group_size,
        });
    }

    let demo_chosen = index::sample(rng, pool_size, demo_total).into_vec();
    let taken: HashSet<PoolIndex> = demo_chosen.iter().copied().collect();
    let remaining: Vec<PoolIndex> = (0..pool_size).filter(|i| !taken.contains(i)).collect();
    let query_group: Vec<PoolIndex> = index::sample(rng, remaining.len(), group_size)
        .into_iter()
        .map(|slot| remaining[slot])
        .collect();

    let demo_groups = demo_chosen
        .chunks_exact(group_size)
        .map(|chunk| chunk.to_vec())
        .collect();

    Ok(GroupSelection {
        demo_groups,
        query_group,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn groups_are_disjoint_and_sized() {
        let mut rng = StdRng::from_seed([7u8; 32]);
        let selection = select_groups(100, 3, 4, &mut rng).unwrap();

        assert_eq!(selection.demo_groups.len(), 4);
        assert_eq!(selection.query_group.len(), 3);
        for group in &selection.demo_groups {
            assert_eq!(group.len(), 3);
        }

        let mut seen = HashSet::new();
        for &i in selection.demo_groups.iter().flatten() {
            assert!(seen.insert(i), "demo index {i} repeated");
        }
        for &i in &selection.query_group {
            assert!(seen.insert(i), "query index {i} collides");
        }
        assert!(seen.iter().all(|&i| i < 100));
    }

    #[test]
    fn exact_pool_size_consumes_every_index() {
        let mut rng = StdRng::from_seed([1u8; 32]);
        let selection = select_groups(15, 3, 4, &mut rng).unwrap();
        let mut all: Vec<PoolIndex> = selection
            .demo_groups
            .iter()
            .flatten()
            .chain(selection.query_group.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn short_pool_is_rejected_with_quantities() {
        let mut rng = StdRng::from_seed([2u8; 32]);
        let err = select_groups(8, 3, 2, &mut rng).unwrap_err();
        match err {
            GeneratorError::InsufficientPoolSize {
                pool_size,
                required,
                num_groups,
                group_size,
            } => {
                assert_eq!(pool_size, 8);
                assert_eq!(required, 9);
                assert_eq!(num_groups, 3);
                assert_eq!(group_size, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_demo_groups_still_yields_a_query_group() {
        let mut rng = StdRng::from_seed([3u8; 32]);
        let selection = select_groups(10, 2, 0, &mut rng).unwrap();
        assert!(selection.demo_groups.is_empty());
        assert_eq!(selection.query_group.len(), 2);
    }

    #[test]
    fn zero_group_size_is_a_configuration_error() {
        let mut rng = StdRng::from_seed([4u8; 32]);
        let err = select_groups(10, 0, 2, &mut rng).unwrap_err();
        assert!(matches!(err, GeneratorError::Configuration(_)));
    }

    #[test]
    fn same_rng_state_reproduces_the_selection() {
        let mut a = StdRng::from_seed([9u8; 32]);
        let mut b = StdRng::from_seed([9u8; 32]);
        let first = select_groups(64, 2, 3, &mut a).unwrap();
        let second = select_groups(64, 2, 3, &mut b).unwrap();
        assert_eq!(first, second);
    }
}
