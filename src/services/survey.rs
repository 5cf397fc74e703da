//! Survey service
//!
//! Owns the current record set for the process and the repository it is
//! persisted to. Every mutation is applied in memory first, then the whole
//! set is written back.

use std::path::{Path, PathBuf};

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{info, warn};

use super::export_pipeline::{self, ExportError};
use super::header_resolver::find_column;
use super::import_pipeline::{self, ImportError, ImportOptions};
use super::links::{self, ShareLink};
use super::normalizer::is_reserved_column;
use super::partitioner::AssignmentPolicy;
use crate::db::{KeyValueStore, StorageError, SurveyRepository};
use crate::types::{
    CellValue, DynamicStatus, ExportFile, ExportFilter, ExportFormat, Gender, ImportReport,
    LogicalField, RecordPatch, RecordSet, RecordStatus, SchemaMode, VolunteerSummary,
};

#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record '{0}' not found")]
    RecordNotFound(String),

    #[error("invalid edit: {0}")]
    InvalidPatch(String),

    #[error("no survey data, import a file first")]
    NoData,
}

/// Deployment-level choices the service runs with.
#[derive(Debug, Clone)]
pub struct SurveySettings {
    pub schema: SchemaMode,
    pub policy: AssignmentPolicy,
    pub form_base_url: String,
}

/// One row of a record listing, schema-independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLine {
    pub id: String,
    pub volunteer_id: String,
    pub name: String,
    pub status: &'static str,
}

pub struct SurveyService<S> {
    repo: SurveyRepository<S>,
    settings: SurveySettings,
    state: Option<RecordSet>,
}

impl<S: KeyValueStore> SurveyService<S> {
    /// Load whatever the repository holds. Corrupt data starts the service empty.
    pub fn open(repo: SurveyRepository<S>, settings: SurveySettings) -> Self {
        let state = repo.load_or_recover();
        Self {
            repo,
            settings,
            state,
        }
    }

    pub fn records(&self) -> Option<&RecordSet> {
        self.state.as_ref()
    }

    pub async fn import_file(&mut self, path: &Path) -> Result<ImportReport, SurveyError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SurveyError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Read {} bytes from {}", bytes.len(), path.display());
        self.import_bytes(&bytes)
    }

    /// Replace the current set with a fresh import. A file that fails to
    /// import leaves the current set untouched.
    pub fn import_bytes(&mut self, bytes: &[u8]) -> Result<ImportReport, SurveyError> {
        let options = ImportOptions {
            schema: self.settings.schema,
            policy: self.settings.policy,
            import_stamp_ms: Utc::now().timestamp_millis(),
        };
        let output = import_pipeline::import(bytes, &options)?;
        self.commit(output.records)?;
        Ok(output.report)
    }

    /// Keeps the in-memory set even when the write fails, so the caller can
    /// report the storage error without losing work.
    fn commit(&mut self, records: RecordSet) -> Result<(), SurveyError> {
        let records = self.state.insert(records);
        if let Err(e) = self.repo.save(records) {
            warn!("Failed to persist survey data: {}", e);
            return Err(e.into());
        }
        Ok(())
    }

    fn current(&self) -> Result<&RecordSet, SurveyError> {
        self.state.as_ref().ok_or(SurveyError::NoData)
    }

    /// Apply `field=value` edits to one record and mark it updated.
    pub fn update(&mut self, id: &str, edits: &[(String, String)]) -> Result<(), SurveyError> {
        let schema = self.current()?.schema();
        match schema {
            SchemaMode::Fixed => {
                let record_id: u32 = id
                    .trim()
                    .parse()
                    .map_err(|_| SurveyError::RecordNotFound(id.to_string()))?;
                self.update_fixed(record_id, fixed_patch(edits)?)
            }
            SchemaMode::Dynamic => self.update_dynamic(id, dynamic_patch(edits)?),
        }
    }

    pub fn update_fixed(&mut self, id: u32, patch: RecordPatch) -> Result<(), SurveyError> {
        let mut records = self.current()?.clone();
        let RecordSet::Fixed { users, .. } = &mut records else {
            return Err(SurveyError::InvalidPatch(
                "field patch sent to a dynamic record set".to_string(),
            ));
        };
        let record = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| SurveyError::RecordNotFound(id.to_string()))?;
        patch.apply(record);
        record.status = RecordStatus::Updated;
        info!("Updated record {}", id);
        self.commit(records)
    }

    pub fn update_dynamic(
        &mut self,
        id: &str,
        patch: IndexMap<String, CellValue>,
    ) -> Result<(), SurveyError> {
        let mut records = self.current()?.clone();
        let RecordSet::Dynamic { users, columns } = &mut records else {
            return Err(SurveyError::InvalidPatch(
                "column patch sent to a fixed record set".to_string(),
            ));
        };
        let record = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| SurveyError::RecordNotFound(id.to_string()))?;
        for (column, value) in patch {
            if !columns.contains(&column) {
                columns.push(column.clone());
            }
            record.data.insert(column, value);
        }
        record.status = DynamicStatus::Updated;
        info!("Updated record {}", id);
        self.commit(records)
    }

    /// Drop the stored set and the in-memory copy.
    pub fn reset(&mut self) -> Result<(), SurveyError> {
        self.state = None;
        self.repo.clear()?;
        info!("Survey data cleared");
        Ok(())
    }

    pub fn export(
        &self,
        filter: ExportFilter,
        format: ExportFormat,
    ) -> Result<ExportFile, SurveyError> {
        let records = self
            .state
            .as_ref()
            .ok_or(SurveyError::Export(ExportError::NothingToExport))?;
        Ok(export_pipeline::export(records, filter, format)?)
    }

    /// Per-volunteer totals in bucket order.
    pub fn volunteers(&self) -> Vec<VolunteerSummary> {
        let mut summary: IndexMap<String, VolunteerSummary> = IndexMap::new();
        for line in self.lines() {
            let entry = summary
                .entry(line.volunteer_id.clone())
                .or_insert_with(|| VolunteerSummary {
                    volunteer_id: line.volunteer_id.clone(),
                    total: 0,
                    updated: 0,
                });
            entry.total += 1;
            if line.status == RecordStatus::Updated.as_str() {
                entry.updated += 1;
            }
        }
        summary.into_values().collect()
    }

    /// Records of one volunteer in import order. `3` and `V3` name the same bucket.
    pub fn records_for(&self, volunteer: &str) -> Vec<RecordLine> {
        let wanted = bucket_key(volunteer);
        self.lines()
            .into_iter()
            .filter(|line| bucket_key(&line.volunteer_id) == wanted)
            .collect()
    }

    /// Every record, as a listing row.
    pub fn lines(&self) -> Vec<RecordLine> {
        match &self.state {
            None => Vec::new(),
            Some(RecordSet::Fixed { users, .. }) => users
                .iter()
                .map(|u| RecordLine {
                    id: u.id.to_string(),
                    volunteer_id: u.volunteer_id.to_string(),
                    name: u.name.clone(),
                    status: u.status.as_str(),
                })
                .collect(),
            Some(RecordSet::Dynamic { users, .. }) => users
                .iter()
                .map(|u| RecordLine {
                    id: u.id.clone(),
                    volunteer_id: u.volunteer_id.clone(),
                    name: links::dynamic_name(u),
                    status: u.status.as_str(),
                })
                .collect(),
        }
    }

    /// Column heading for the name in listings: the sheet's own name column
    /// when one was resolved, `name` otherwise.
    pub fn name_label(&self) -> String {
        let column = match &self.state {
            None => None,
            Some(RecordSet::Fixed { headers, .. }) => headers.column(LogicalField::Name),
            Some(RecordSet::Dynamic { columns, .. }) => {
                find_column(columns, LogicalField::Name.keywords())
            }
        };
        column.unwrap_or("name").to_string()
    }

    pub fn share_links(&self, volunteer: Option<&str>) -> Vec<ShareLink> {
        let base = self.settings.form_base_url.as_str();
        let wanted = volunteer.map(bucket_key);
        let keep = |volunteer_id: &str| {
            wanted
                .as_deref()
                .map_or(true, |w| bucket_key(volunteer_id) == w)
        };

        match &self.state {
            None => Vec::new(),
            Some(RecordSet::Fixed { users, .. }) => users
                .iter()
                .filter(|u| keep(&u.volunteer_id.to_string()))
                .map(|u| links::fixed_link(base, u))
                .collect(),
            Some(RecordSet::Dynamic { users, .. }) => users
                .iter()
                .filter(|u| keep(&u.volunteer_id))
                .map(|u| links::dynamic_link(base, u))
                .collect(),
        }
    }
}

fn bucket_key(volunteer: &str) -> String {
    let trimmed = volunteer.trim();
    trimmed
        .strip_prefix(&['V', 'v'][..])
        .unwrap_or(trimmed)
        .to_string()
}

fn fixed_patch(edits: &[(String, String)]) -> Result<RecordPatch, SurveyError> {
    let mut patch = RecordPatch::default();
    for (key, value) in edits {
        let field = LogicalField::parse(key)
            .ok_or_else(|| SurveyError::InvalidPatch(format!("unknown field '{}'", key)))?;
        let value = value.clone();
        match field {
            LogicalField::Name => patch.name = Some(value),
            LogicalField::Email => patch.email = Some(value),
            LogicalField::Phone => patch.phone = Some(value),
            LogicalField::Gender => {
                let gender = Gender::from_label(&value).ok_or_else(|| {
                    SurveyError::InvalidPatch(format!(
                        "gender must be one of: {}",
                        Gender::ALL.map(Gender::label).join(", ")
                    ))
                })?;
                patch.gender = Some(gender);
            }
            LogicalField::City => patch.city = Some(value),
            LogicalField::Country => patch.country = Some(value),
        }
    }
    Ok(patch)
}

fn dynamic_patch(edits: &[(String, String)]) -> Result<IndexMap<String, CellValue>, SurveyError> {
    let mut patch = IndexMap::new();
    for (key, value) in edits {
        let column = key.trim();
        if column.is_empty() || is_reserved_column(column) {
            return Err(SurveyError::InvalidPatch(format!(
                "column '{}' cannot be edited",
                key
            )));
        }
        patch.insert(column.to_string(), CellValue::from(value.as_str()));
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::num::NonZeroU32;

    use crate::db::MemoryStore;

    const FIXED_CSV: &str = "Name,Email,Gender,City\r\n\
        Asha,asha@example.com,Female,Madurai\r\n\
        Ravi,ravi@example.com,Male,Salem\r\n\
        Kumar,kumar@example.com,,Erode\r\n";

    const DYNAMIC_CSV: &str = "Ward,Head of family name,Members\r\n\
        1,Selvi,4\r\n\
        2,Murugan,3\r\n\
        3,Latha,5\r\n";

    fn settings(schema: SchemaMode, policy: AssignmentPolicy) -> SurveySettings {
        SurveySettings {
            schema,
            policy,
            form_base_url: "http://localhost:3000/".to_string(),
        }
    }

    fn chunked(n: u32) -> AssignmentPolicy {
        AssignmentPolicy::Chunked {
            batch_size: NonZeroU32::new(n).unwrap(),
        }
    }

    fn round_robin(n: u32) -> AssignmentPolicy {
        AssignmentPolicy::RoundRobin {
            volunteer_count: NonZeroU32::new(n).unwrap(),
        }
    }

    fn fixed_service(store: &MemoryStore) -> SurveyService<&MemoryStore> {
        let mut service = SurveyService::open(
            SurveyRepository::new(store),
            settings(SchemaMode::Fixed, chunked(2)),
        );
        service.import_bytes(FIXED_CSV.as_bytes()).unwrap();
        service
    }

    fn edits(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Reads succeed, writes fail.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_import_persists_and_reopens() {
        let store = MemoryStore::new();
        let service = fixed_service(&store);
        assert_eq!(service.records().map(RecordSet::len), Some(3));

        let reopened = SurveyService::open(
            SurveyRepository::new(&store),
            settings(SchemaMode::Fixed, chunked(2)),
        );
        assert_eq!(reopened.records(), service.records());
    }

    #[test]
    fn test_failed_import_keeps_previous_set() {
        let store = MemoryStore::new();
        let mut service = fixed_service(&store);
        let before = service.records().cloned();

        let err = service.import_bytes(b"Email\r\nx@example.com\r\n").unwrap_err();
        assert!(matches!(
            err,
            SurveyError::Import(ImportError::MissingColumn(LogicalField::Name))
        ));
        assert_eq!(service.records().cloned(), before);
    }

    #[test]
    fn test_volunteers_and_records_for() {
        let store = MemoryStore::new();
        let mut service = fixed_service(&store);
        service.update("1", &edits(&[("city", "Trichy")])).unwrap();

        let volunteers = service.volunteers();
        assert_eq!(volunteers.len(), 2);
        assert_eq!(volunteers[0].volunteer_id, "1");
        assert_eq!((volunteers[0].total, volunteers[0].updated), (2, 1));
        assert_eq!((volunteers[1].total, volunteers[1].updated), (1, 0));

        let second = service.records_for("V2");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "Kumar");
    }

    #[test]
    fn test_update_fixed_marks_updated_and_persists() {
        let store = MemoryStore::new();
        let mut service = fixed_service(&store);
        service
            .update("0", &edits(&[("phone", "9840012345"), ("gender", "Other")]))
            .unwrap();
        // second edit leaves status Updated
        service.update("0", &edits(&[("city", "Chennai")])).unwrap();

        let stored = SurveyRepository::new(&store).load().unwrap().unwrap();
        let RecordSet::Fixed { users, .. } = stored else {
            panic!("expected fixed record set");
        };
        assert_eq!(users[0].phone, "9840012345");
        assert_eq!(users[0].gender, Gender::Other);
        assert_eq!(users[0].city, "Chennai");
        assert_eq!(users[0].volunteer_id, 1);
        assert_eq!(users[0].status, RecordStatus::Updated);
        assert_eq!(users[1].status, RecordStatus::NotUpdated);
    }

    #[test]
    fn test_update_rejects_bad_input() {
        let store = MemoryStore::new();
        let mut service = fixed_service(&store);

        let err = service.update("0", &edits(&[("gender", "Unknown")])).unwrap_err();
        assert!(matches!(err, SurveyError::InvalidPatch(_)));
        for synonym in ["male", "ஆண்"] {
            let err = service.update("0", &edits(&[("gender", synonym)])).unwrap_err();
            assert!(matches!(err, SurveyError::InvalidPatch(_)));
        }
        let err = service.update("0", &edits(&[("volunteerId", "9")])).unwrap_err();
        assert!(matches!(err, SurveyError::InvalidPatch(_)));
        let err = service.update("99", &edits(&[("city", "X")])).unwrap_err();
        assert!(matches!(err, SurveyError::RecordNotFound(_)));

        assert_eq!(service.records().map(RecordSet::updated_count), Some(0));
    }

    #[test]
    fn test_update_without_data() {
        let mut service = SurveyService::open(
            SurveyRepository::new(MemoryStore::new()),
            settings(SchemaMode::Fixed, chunked(40)),
        );
        let err = service.update("0", &edits(&[("city", "X")])).unwrap_err();
        assert!(matches!(err, SurveyError::NoData));
    }

    #[test]
    fn test_name_label_uses_resolved_column() {
        let store = MemoryStore::new();
        let service = fixed_service(&store);
        assert_eq!(service.name_label(), "Name");

        let mut service = SurveyService::open(
            SurveyRepository::new(MemoryStore::new()),
            settings(SchemaMode::Fixed, chunked(2)),
        );
        assert_eq!(service.name_label(), "name");
        service
            .import_bytes("Name / பெயர்,City\r\nAsha,Madurai\r\n".as_bytes())
            .unwrap();
        assert_eq!(service.name_label(), "Name / பெயர்");

        let mut service = SurveyService::open(
            SurveyRepository::new(MemoryStore::new()),
            settings(SchemaMode::Dynamic, round_robin(50)),
        );
        service.import_bytes(DYNAMIC_CSV.as_bytes()).unwrap();
        assert_eq!(service.name_label(), "Head of family name");
    }

    #[test]
    fn test_dynamic_update_merges_columns() {
        let mut service = SurveyService::open(
            SurveyRepository::new(MemoryStore::new()),
            settings(SchemaMode::Dynamic, round_robin(50)),
        );
        service.import_bytes(DYNAMIC_CSV.as_bytes()).unwrap();
        let id = service.lines()[1].id.clone();
        assert_eq!(service.lines()[1].name, "Murugan");

        service
            .update(&id, &edits(&[("Members", "4"), ("Landmark", "Temple")]))
            .unwrap();

        let Some(RecordSet::Dynamic { users, columns }) = service.records() else {
            panic!("expected dynamic record set");
        };
        let keys: Vec<&String> = users[1].data.keys().collect();
        assert_eq!(keys, vec!["Ward", "Head of family name", "Members", "Landmark"]);
        assert_eq!(users[1].data["Members"], CellValue::from("4"));
        assert_eq!(users[1].status, DynamicStatus::Updated);
        assert_eq!(columns.last().map(String::as_str), Some("Landmark"));

        let err = service.update(&id, &edits(&[("status", "Pending")])).unwrap_err();
        assert!(matches!(err, SurveyError::InvalidPatch(_)));
    }

    #[test]
    fn test_export_only_updated() {
        let store = MemoryStore::new();
        let mut service = fixed_service(&store);

        let err = service
            .export(ExportFilter::OnlyUpdated, ExportFormat::Csv)
            .unwrap_err();
        assert!(matches!(err, SurveyError::Export(ExportError::NothingToExport)));

        service.update("2", &edits(&[("gender", "Male")])).unwrap();
        let file = service
            .export(ExportFilter::OnlyUpdated, ExportFormat::Csv)
            .unwrap();
        assert_eq!(file.row_count, 1);
        assert_eq!(file.filename, "updated_user_records.csv");
    }

    #[test]
    fn test_share_links_filtered_by_volunteer() {
        let store = MemoryStore::new();
        let service = fixed_service(&store);
        let all = service.share_links(None);
        assert_eq!(all.len(), 3);
        let first = service.share_links(Some("1"));
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].form_url, "http://localhost:3000/#/form/1");
    }

    #[test]
    fn test_reset_clears_store() {
        let store = MemoryStore::new();
        let mut service = fixed_service(&store);
        service.reset().unwrap();

        assert!(service.records().is_none());
        assert!(service.volunteers().is_empty());
        assert_eq!(SurveyRepository::new(&store).load().unwrap(), None);
    }

    #[test]
    fn test_storage_failure_keeps_memory_state() {
        let mut service = SurveyService::open(
            SurveyRepository::new(ReadOnlyStore(MemoryStore::new())),
            settings(SchemaMode::Fixed, chunked(40)),
        );
        let err = service.import_bytes(FIXED_CSV.as_bytes()).unwrap_err();
        assert!(matches!(err, SurveyError::Storage(StorageError::Io { .. })));
        assert_eq!(service.records().map(RecordSet::len), Some(3));
    }

    #[test]
    fn test_import_file_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DYNAMIC_CSV.as_bytes()).unwrap();

        let mut service = SurveyService::open(
            SurveyRepository::new(MemoryStore::new()),
            settings(SchemaMode::Dynamic, round_robin(2)),
        );
        let report = tokio_test::block_on(service.import_file(file.path())).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.volunteer_count, 2);

        let missing = tokio_test::block_on(service.import_file(Path::new("/nonexistent/x.csv")));
        assert!(matches!(missing, Err(SurveyError::Read { .. })));
    }
}
