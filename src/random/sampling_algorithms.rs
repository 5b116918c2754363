//! Uniform sampling from iterators of known length. These are generic over the container type,
//! so callers can sample from filtered views of the population without collecting them first.

use crate::rand::seq::index::sample as choose_range;
use crate::rand::Rng;

/// Sample a random element uniformly from a container of known length.
///
/// We do not assume the container is randomly indexable, only that it can be iterated over.
pub fn sample_single_from_known_length<I, R, T>(rng: &mut R, mut iter: I) -> Option<T>
where
    R: Rng,
    I: ExactSizeIterator<Item = T>,
{
    let len = iter.len();
    if len == 0 {
        return None;
    }
    let index = rng.random_range(0..len);
    iter.nth(index)
}

/// Sample multiple random elements uniformly without replacement from a container of known
/// length. This function assumes `iter.len() >= requested`. The selected elements keep the
/// order in which the iterator yields them.
pub fn sample_multiple_from_known_length<I, R, T>(rng: &mut R, iter: I, requested: usize) -> Vec<T>
where
    R: Rng,
    I: ExactSizeIterator<Item = T>,
{
    if requested == 0 {
        return Vec::new();
    }
    let mut indexes = Vec::with_capacity(requested);
    indexes.extend(choose_range(rng, iter.len(), requested));
    indexes.sort_unstable();

    let mut index_iterator = indexes.into_iter().peekable();
    let mut selected = Vec::with_capacity(requested);
    for (idx, item) in iter.enumerate() {
        match index_iterator.peek() {
            Some(&next_idx) if next_idx == idx => {
                selected.push(item);
                index_iterator.next();
            }
            Some(_) => {}
            None => break,
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::hashing::HashSet;

    #[test]
    fn single_from_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(42);
        let data: Vec<u32> = Vec::new();
        assert_eq!(sample_single_from_known_length(&mut rng, data.iter()), None);
    }

    #[test]
    fn single_covers_every_element() {
        let mut rng = StdRng::seed_from_u64(42);
        let data: Vec<u32> = (0..5).collect();
        let mut seen = HashSet::default();
        for _ in 0..500 {
            seen.insert(*sample_single_from_known_length(&mut rng, data.iter()).unwrap());
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn multiple_is_distinct_and_ordered() {
        let data: Vec<u32> = (0..1000).collect();
        let requested = 100;
        let mut rng = StdRng::seed_from_u64(42);
        let sample = sample_multiple_from_known_length(&mut rng, data.iter().copied(), requested);

        assert_eq!(sample.len(), requested);
        assert!(sample.iter().all(|v| *v < 1000));
        let unique: HashSet<_> = sample.iter().collect();
        assert_eq!(unique.len(), sample.len());
        assert!(sample.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn multiple_of_everything() {
        let data: Vec<u32> = (0..10).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let sample = sample_multiple_from_known_length(&mut rng, data.iter().copied(), 10);
        assert_eq!(sample, data);
    }

    #[test]
    fn multiple_is_roughly_uniform() {
        let data: Vec<usize> = (0..10).collect();
        let mut counts = [0usize; 10];
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..10_000 {
            for v in sample_multiple_from_known_length(&mut rng, data.iter().copied(), 3) {
                counts[v] += 1;
            }
        }
        // Each element is expected 3000 times.
        assert!(counts.iter().all(|&c| (2700..3300).contains(&c)), "{counts:?}");
    }
}
