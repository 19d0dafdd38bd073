use crate::model::ResultMeta;
use crate::repository::{MetaRow, ResultRepository};
use crate::storage::KvStore;

/// Marks `result_id` active and every other row of `application_id`
/// inactive. Returns whether any flag changed.
pub fn apply_active<'a>(
    metas: impl IntoIterator<Item = &'a mut ResultMeta>,
    application_id: i64,
    result_id: i64,
) -> bool {
    let mut changed = false;
    for m in metas
        .into_iter()
        .filter(|m| m.application_id == application_id)
    {
        let should_be_active = m.result_id == result_id;
        if m.is_active != should_be_active {
            m.is_active = should_be_active;
            changed = true;
        }
    }
    changed
}

impl<S: KvStore> ResultRepository<S> {
    /// Makes `result_id` the single active result of `application_id`.
    ///
    /// A `result_id` that does not belong to the application leaves it with
    /// no active result. Storage is only written when a flag changed; the
    /// return value says whether it was.
    pub fn set_active(&self, application_id: i64, result_id: i64) -> anyhow::Result<bool> {
        let mut rows = self.load_meta_rows();
        let changed = apply_active(
            rows.iter_mut().filter_map(MetaRow::known_mut),
            application_id,
            result_id,
        );
        if changed {
            self.save_meta_rows(&rows)?;
            tracing::info!(event = "result.activated", application_id, result_id);
        } else {
            tracing::debug!(event = "result.activate_noop", application_id, result_id);
        }
        Ok(changed)
    }

    pub fn get_active_result_id(&self, application_id: i64) -> Option<i64> {
        self.load_metas()
            .iter()
            .find(|m| m.application_id == application_id && m.is_active)
            .map(|m| m.result_id)
    }
}
