// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};
use crate::report::{ExtractionResult, ReportMetadata};
use crate::utils::error::StorageError;

/// Folder-name marker for annual statements among a company's reports.
const REPORT_KIND_MARKER: &str = "jahresabschluss";
const RAW_REPORT_MARKER: &str = "raw_report";
const METADATA_SUFFIX: &str = "_metadata.json";

/// A report loaded from the local store.
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub folder: PathBuf,
    pub name: String,
    pub html: String,
    pub metadata: Option<ReportMetadata>,
}

/// Local report archive laid out as `<base>/<company>/<report>/`.
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Opens an existing store rooted at `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.is_dir() {
            return Err(StorageError::StoreNotFound(base_path.display().to_string()));
        }

        Ok(Self { base_dir: base_path })
    }

    /// Company folders in name order.
    pub fn company_folders(&self) -> Result<Vec<PathBuf>, StorageError> {
        sorted_subdirs(&self.base_dir)
    }

    /// True if the company folder exists and holds at least one entry.
    pub fn company_folder_exists(&self, company_folder: &str) -> bool {
        let path = self.base_dir.join(company_folder);
        path.is_dir()
            && fs::read_dir(&path)
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false)
    }

    /// Loads the latest Jahresabschluss of a company.
    ///
    /// Report folders sort by name, so the greatest name containing
    /// "jahresabschluss" is taken as the latest. Returns `Ok(None)` if there is
    /// no such folder or it has no raw report HTML.
    pub fn find_latest_report(&self, company_dir: &Path) -> Result<Option<StoredReport>, StorageError> {
        let latest_folder = sorted_subdirs(company_dir)?
            .into_iter()
            .filter(|dir| dir_name(dir).to_lowercase().contains(REPORT_KIND_MARKER))
            .last();

        let Some(folder) = latest_folder else {
            tracing::debug!("No Jahresabschluss folder in {}", company_dir.display());
            return Ok(None);
        };

        let mut files: Vec<PathBuf> = fs::read_dir(&folder)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let Some(html_file) = files.iter().find(|path| {
            let name = dir_name(path);
            name.ends_with(".html") && name.contains(RAW_REPORT_MARKER)
        }) else {
            tracing::debug!("No raw report HTML in {}", folder.display());
            return Ok(None);
        };

        // Filings are not always valid UTF-8; replace rather than fail.
        let bytes = fs::read(html_file)?;
        let html = String::from_utf8_lossy(&bytes).into_owned();

        let metadata = files
            .iter()
            .find(|path| dir_name(path).ends_with(METADATA_SUFFIX))
            .and_then(|path| read_metadata(path));

        tracing::info!("Loaded report {} ({} bytes)", html_file.display(), html.len());

        Ok(Some(StoredReport {
            name: dir_name(&folder),
            folder,
            html,
            metadata,
        }))
    }

    /// Saves an extraction result as `<target_dir>/<report_name>_extraction.json`.
    pub fn save_extraction(
        &self,
        target_dir: &Path,
        report_name: &str,
        result: &ExtractionResult,
    ) -> Result<PathBuf, StorageError> {
        // Create the directories if they don't exist
        if !target_dir.exists() {
            fs::create_dir_all(target_dir)
                .map_err(StorageError::IoError)?;
        }

        let file_path = target_dir.join(format!("{}_extraction.json", report_name));

        let document = serde_json::json!({
            "report": report_name,
            "result": result,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let document_str = serde_json::to_string_pretty(&document)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, document_str)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved extraction result to {}", file_path.display());

        Ok(file_path)
    }
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_metadata(path: &Path) -> Option<ReportMetadata> {
    let raw = fs::read_to_string(path)
        .map_err(|e| tracing::warn!("Could not read metadata {}: {}", path.display(), e))
        .ok()?;
    serde_json::from_str(&raw)
        .map_err(|e| tracing::warn!("Ignoring malformed metadata {}: {}", path.display(), e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_report(company_dir: &Path, report: &str, html: &str) -> PathBuf {
        let folder = company_dir.join(report);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(format!("{}_raw_report.html", report)), html).unwrap();
        folder
    }

    #[test]
    fn test_new_requires_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StorageManager::new(dir.path()).is_ok());
        assert!(matches!(
            StorageManager::new(dir.path().join("missing")),
            Err(StorageError::StoreNotFound(_))
        ));
    }

    #[test]
    fn test_company_folder_exists() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        assert!(!storage.company_folder_exists("Test_Company"));

        fs::create_dir_all(dir.path().join("Test_Company")).unwrap();
        assert!(!storage.company_folder_exists("Test_Company"), "Empty folder should not count");

        fs::create_dir_all(dir.path().join("Test_Company").join("Jahresabschluss_2021")).unwrap();
        assert!(storage.company_folder_exists("Test_Company"));
    }

    #[test]
    fn test_find_latest_report_picks_greatest_jahresabschluss() {
        let dir = tempfile::tempdir().unwrap();
        let company_dir = dir.path().join("Test_Company");
        write_report(&company_dir, "Jahresabschluss_2021", "<p>2021</p>");
        let latest = write_report(&company_dir, "Jahresabschluss_2022", "<p>2022</p>");
        write_report(&company_dir, "Other_Report", "<p>other</p>");

        let storage = StorageManager::new(dir.path()).unwrap();
        let report = storage.find_latest_report(&company_dir).unwrap().expect("report should be found");

        assert_eq!(report.folder, latest);
        assert_eq!(report.name, "Jahresabschluss_2022");
        assert_eq!(report.html, "<p>2022</p>");
        assert!(report.metadata.is_none());
    }

    #[test]
    fn test_find_latest_report_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let company_dir = dir.path().join("Muster_GmbH");
        let folder = write_report(&company_dir, "Jahresabschluss_2020", "<p></p>");
        fs::write(
            folder.join("Jahresabschluss_2020_metadata.json"),
            r#"{"name": "Jahresabschluss 2020", "date": "2021-06-30 00:00:00", "company_name": "Muster GmbH"}"#,
        )
        .unwrap();

        let storage = StorageManager::new(dir.path()).unwrap();
        let report = storage.find_latest_report(&company_dir).unwrap().unwrap();
        let metadata = report.metadata.expect("metadata should be parsed");
        assert_eq!(metadata.company_name, "Muster GmbH");
        assert_eq!(metadata.date, "2021-06-30 00:00:00");
    }

    #[test]
    fn test_find_latest_report_without_html() {
        let dir = tempfile::tempdir().unwrap();
        let company_dir = dir.path().join("Test_Company");
        fs::create_dir_all(company_dir.join("Jahresabschluss_2022")).unwrap();
        fs::create_dir_all(company_dir.join("Other_Report")).unwrap();

        let storage = StorageManager::new(dir.path()).unwrap();
        assert!(storage.find_latest_report(&company_dir).unwrap().is_none());
    }

    #[test]
    fn test_save_extraction_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let target = dir.path().join("out").join("Test_Company");

        let mut result = ExtractionResult::default();
        result.sach_start = "1.000".to_string();
        let path = storage.save_extraction(&target, "Jahresabschluss_2022", &result).unwrap();

        assert_eq!(path, target.join("Jahresabschluss_2022_extraction.json"));
        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["report"], "Jahresabschluss_2022");
        assert_eq!(saved["result"]["Sachanlagen Start"], "1.000");
        assert!(saved["extraction_timestamp"].is_string());
    }
}
