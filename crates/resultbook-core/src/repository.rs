use crate::model::{ResultLine, ResultMeta, SaveResultRequest};
use crate::storage::{self, KvStore, META_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the metadata document.
///
/// Rows that do not decode as [`ResultMeta`] stay in the document verbatim:
/// they are invisible to reads but every rewrite carries them through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum MetaRow {
    Known(ResultMeta),
    Opaque(Value),
}

impl MetaRow {
    pub(crate) fn known_mut(&mut self) -> Option<&mut ResultMeta> {
        match self {
            MetaRow::Known(m) => Some(m),
            MetaRow::Opaque(_) => None,
        }
    }

    /// Id claimed by the row. Opaque rows count too, so a new id never
    /// collides with one of them.
    pub(crate) fn result_id(&self) -> Option<i64> {
        match self {
            MetaRow::Known(m) => Some(m.result_id),
            MetaRow::Opaque(v) => v.get("resultID").and_then(Value::as_i64),
        }
    }
}

/// Results and their lines, persisted through a [`KvStore`].
///
/// Metadata for every application lives in one document; each result's
/// lines live under their own key. Read-modify-write cycles are not
/// guarded, so a repository must have a single writer.
pub struct ResultRepository<S> {
    store: S,
}

impl<S: KvStore> ResultRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn load_meta_rows(&self) -> Vec<MetaRow> {
        let rows: Vec<MetaRow> = storage::load(&self.store, META_KEY, Vec::new());
        let opaque = rows
            .iter()
            .filter(|r| matches!(r, MetaRow::Opaque(_)))
            .count();
        if opaque > 0 {
            tracing::warn!(
                event = "result.meta_rows_skipped",
                rows = opaque,
                "metadata rows with an unexpected shape are kept but not listed"
            );
        }
        rows
    }

    pub(crate) fn load_metas(&self) -> Vec<ResultMeta> {
        self.load_meta_rows()
            .into_iter()
            .filter_map(|row| match row {
                MetaRow::Known(m) => Some(m),
                MetaRow::Opaque(_) => None,
            })
            .collect()
    }

    pub(crate) fn save_meta_rows(&self, rows: &[MetaRow]) -> anyhow::Result<()> {
        storage::save(&self.store, META_KEY, rows)
    }

    /// Results of one application, newest first. Equal timestamps keep
    /// their stored order.
    pub fn list_results_by_application(&self, application_id: i64) -> Vec<ResultMeta> {
        let mut metas: Vec<ResultMeta> = self
            .load_metas()
            .into_iter()
            .filter(|m| m.application_id == application_id)
            .collect();
        metas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        metas
    }

    pub fn get_result(&self, result_id: i64) -> Option<ResultMeta> {
        self.load_metas()
            .into_iter()
            .find(|m| m.result_id == result_id)
    }

    pub fn get_result_lines(&self, result_id: i64) -> Vec<ResultLine> {
        storage::load(&self.store, &storage::lines_key(result_id), Vec::new())
    }

    pub fn save_result(&self, req: SaveResultRequest) -> anyhow::Result<i64> {
        self.save_result_at(req, Utc::now())
    }

    /// Stores a new result stamped with `created_at` and returns its id.
    ///
    /// Writes the metadata document first, then the lines. A failure in
    /// between leaves a result without lines, which reads back as empty.
    pub fn save_result_at(
        &self,
        req: SaveResultRequest,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let mut rows = self.load_meta_rows();
        let result_id = crate::ids::next_id_after(rows.iter().filter_map(MetaRow::result_id))?;
        let application_id = req.application_id;

        rows.push(MetaRow::Known(ResultMeta {
            result_id,
            application_id,
            created_at,
            is_active: false,
            has_summer: req.has_summer,
            label: req.label,
        }));
        self.save_meta_rows(&rows)?;

        let lines: Vec<ResultLine> = req
            .lines
            .into_iter()
            .enumerate()
            .map(|(idx, detail)| ResultLine {
                line_id: idx as i64 + 1,
                result_id,
                application_id,
                detail,
            })
            .collect();
        storage::save(&self.store, &storage::lines_key(result_id), &lines)?;

        tracing::info!(
            event = "result.saved",
            result_id,
            application_id,
            lines = lines.len(),
            set_active = req.set_active
        );

        if req.set_active {
            self.set_active(application_id, result_id)?;
        }
        Ok(result_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineDraft, Units, XCode};
    use crate::storage::MemoryKv;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    fn line(child_id: i64, fd: f64) -> LineDraft {
        LineDraft {
            start_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            child_id,
            provider_id: 500,
            base_type: "LFHPT".into(),
            units: Units::new(fd, 0.0, 0.0, 0.0),
            region: "2".into(),
            x_code: XCode::Zero,
            is_summer: false,
        }
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_save_stamps_lines_in_order() {
        let repo = ResultRepository::new(MemoryKv::new());
        let id = repo
            .save_result(SaveResultRequest::new(42, vec![line(1, 1.0), line(2, 2.0), line(3, 3.0)]))
            .unwrap();

        let lines = repo.get_result_lines(id);
        assert_eq!(lines.len(), 3);
        for (i, l) in lines.iter().enumerate() {
            assert_eq!(l.line_id, i as i64 + 1);
            assert_eq!(l.result_id, id);
            assert_eq!(l.application_id, 42);
            assert_eq!(l.detail.child_id, i as i64 + 1);
        }
    }

    #[test]
    fn test_save_writes_meta_then_lines() {
        let repo = ResultRepository::new(MemoryKv::new());
        repo.save_result(SaveResultRequest::new(1, vec![line(1, 1.0)]))
            .unwrap();
        assert_eq!(repo.store().write_count(), 2);
        assert_eq!(
            repo.store().keys(),
            vec!["calcResultsLines:700000001", "calcResultsMeta"]
        );
    }

    #[test]
    fn test_saved_meta_fields() {
        let repo = ResultRepository::new(MemoryKv::new());
        let id = repo
            .save_result_at(
                SaveResultRequest::new(3, Vec::new())
                    .with_label("Aug auth v2")
                    .with_summer(true),
                at(9),
            )
            .unwrap();

        let meta = repo.get_result(id).unwrap();
        assert_eq!(meta.application_id, 3);
        assert_eq!(meta.created_at, at(9));
        assert!(!meta.is_active);
        assert!(meta.has_summer);
        assert_eq!(meta.label.as_deref(), Some("Aug auth v2"));
        assert!(repo.get_result_lines(id).is_empty());
    }

    #[test]
    fn test_list_filters_and_sorts_newest_first() {
        let repo = ResultRepository::new(MemoryKv::new());
        let t1 = repo
            .save_result_at(SaveResultRequest::new(7, Vec::new()), at(1))
            .unwrap();
        let other = repo
            .save_result_at(SaveResultRequest::new(8, Vec::new()), at(2))
            .unwrap();
        let t3 = repo
            .save_result_at(SaveResultRequest::new(7, Vec::new()), at(3))
            .unwrap();

        let ids: Vec<i64> = repo
            .list_results_by_application(7)
            .iter()
            .map(|m| m.result_id)
            .collect();
        assert_eq!(ids, vec![t3, t1]);
        assert!(!ids.contains(&other));
        assert!(repo.list_results_by_application(99).is_empty());
    }

    #[test]
    fn test_list_ties_keep_stored_order() {
        let repo = ResultRepository::new(MemoryKv::new());
        let a = repo
            .save_result_at(SaveResultRequest::new(7, Vec::new()), at(5))
            .unwrap();
        let b = repo
            .save_result_at(SaveResultRequest::new(7, Vec::new()), at(5))
            .unwrap();
        let ids: Vec<i64> = repo
            .list_results_by_application(7)
            .iter()
            .map(|m| m.result_id)
            .collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_missing_lines_read_as_empty() {
        let repo = ResultRepository::new(MemoryKv::new());
        assert!(repo.get_result_lines(700_000_123).is_empty());
        assert!(repo.get_result(700_000_123).is_none());
    }

    #[test]
    fn test_save_with_set_active() {
        let repo = ResultRepository::new(MemoryKv::new());
        let first = repo
            .save_result(SaveResultRequest::new(4, Vec::new()).activate(true))
            .unwrap();
        assert_eq!(repo.get_active_result_id(4), Some(first));

        let second = repo
            .save_result(SaveResultRequest::new(4, Vec::new()).activate(true))
            .unwrap();
        assert_eq!(repo.get_active_result_id(4), Some(second));
        assert!(!repo.get_result(first).unwrap().is_active);
    }

    #[test]
    fn test_save_keeps_rows_of_unexpected_shape() {
        let kv = MemoryKv::new();
        kv.set_item(
            META_KEY,
            &json!([
                {"resultID": 700000004, "applicationID": 2, "createdAt": "2025-08-19T10:00:00Z",
                 "isActive": true, "hasSummer": false},
                {"resultID": 700000009, "applicationID": 3, "createdAt": "2025-08-20"}
            ])
            .to_string(),
        )
        .unwrap();
        let repo = ResultRepository::new(kv);
        assert_eq!(repo.get_active_result_id(2), Some(700000004));

        let id = repo
            .save_result(SaveResultRequest::new(1, Vec::new()).activate(true))
            .unwrap();
        assert_eq!(id, 700000010);

        assert_eq!(repo.get_active_result_id(2), Some(700000004));
        assert_eq!(repo.list_results_by_application(2).len(), 1);
        assert_eq!(repo.get_active_result_id(1), Some(id));

        let raw: Vec<Value> =
            serde_json::from_str(&repo.store().get_item(META_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[1]["createdAt"], "2025-08-20");
        assert_eq!(raw[1]["applicationID"], 3);
    }

    #[test]
    fn test_save_refuses_when_ids_are_exhausted() {
        let kv = MemoryKv::new();
        kv.set_item(
            META_KEY,
            &json!([{"resultID": i64::MAX, "applicationID": 1, "createdAt": "2025-08-19T10:00:00Z"}])
                .to_string(),
        )
        .unwrap();
        let repo = ResultRepository::new(kv);
        let writes = repo.store().write_count();

        assert!(repo.save_result(SaveResultRequest::new(1, Vec::new())).is_err());
        assert_eq!(repo.store().write_count(), writes);
        assert_eq!(repo.list_results_by_application(1).len(), 1);
    }
}
