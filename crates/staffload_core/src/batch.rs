//! Fixed-size chunking for bounded write transactions.

use crate::config::ConfigError;

/// Splits `items` into consecutive chunks of at most `size` elements.
///
/// Order is preserved; only the last chunk may be shorter. Empty input
/// yields no chunks.
///
/// # Errors
/// - `ConfigError::InvalidBatchSize` when `size` is zero.
pub fn batch<T>(items: Vec<T>, size: usize) -> Result<Vec<Vec<T>>, ConfigError> {
    if size == 0 {
        return Err(ConfigError::InvalidBatchSize(size));
    }

    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(items.len()));
    for item in items {
        current.push(item);
        if current.len() == size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::batch;
    use crate::config::ConfigError;

    #[test]
    fn concatenated_chunks_equal_input() {
        let items: Vec<u32> = (0..23).collect();
        for size in [1, 2, 5, 7, 23, 100] {
            let chunks = batch(items.clone(), size).unwrap();
            assert_eq!(chunks.len(), items.len().div_ceil(size));
            assert!(chunks.iter().all(|chunk| !chunk.is_empty() && chunk.len() <= size));
            let rebuilt: Vec<u32> = chunks.into_iter().flatten().collect();
            assert_eq!(rebuilt, items);
        }
    }

    #[test]
    fn only_last_chunk_is_short() {
        let chunks = batch(vec!['a', 'b', 'c', 'd', 'e'], 2).unwrap();
        assert_eq!(chunks, vec![vec!['a', 'b'], vec!['c', 'd'], vec!['e']]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks = batch(Vec::<u8>::new(), 3).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn zero_size_is_a_config_error() {
        let error = batch(vec![1, 2, 3], 0).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidBatchSize(0)));
    }
}
