use crate::repository::{MetaRow, ResultRepository};
use crate::storage::KvStore;

/// Allocated ids start above this offset so they never collide with ids
/// seeded by other systems.
pub const BASE_RESULT_ID: i64 = 700_000_000;

/// Largest of `ids` (or [`BASE_RESULT_ID`] when empty) plus one. Fails
/// once the largest stored id is `i64::MAX`.
pub fn next_id_after(ids: impl IntoIterator<Item = i64>) -> anyhow::Result<i64> {
    let max = ids.into_iter().fold(BASE_RESULT_ID, i64::max);
    max.checked_add(1)
        .ok_or_else(|| anyhow::anyhow!("result ids exhausted: largest stored id is {}", max))
}

impl<S: KvStore> ResultRepository<S> {
    /// Not safe with concurrent writers: two callers can observe the same max.
    pub fn next_result_id(&self) -> anyhow::Result<i64> {
        next_id_after(self.load_meta_rows().iter().filter_map(MetaRow::result_id))
    }
}
