/*
 * Turns a catalog snapshot into an export file and hands it to a sink.
 *
 * File names embed the snapshot version (zero-padded to four digits) and a
 * seconds-resolution timestamp, e.g. `Foo_v0007_2024-05-01_101500.json`, so
 * exports at different versions, or a second or more apart, never collide.
 *
 * Two sinks exist. The folder sink writes into a user-chosen directory and is
 * only available when one has been configured and exists. The download sink
 * writes into the download directory and is always available. `write_export`
 * tries the folder sink first and falls back to the download sink; only if
 * the fallback also fails does the caller see an error.
 *
 * Sinks never replace an existing file. If the name is taken (two exports in
 * the same second, or a clock set back) a `-2`, `-3`, ... suffix is added to
 * the stem, and the receipt carries the name actually written.
 */
use super::models::{MASTER_FILE_DEFAULT, Snapshot};
use super::timestamps;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

pub const EXPORT_FILE_EXTENSION: &str = "json";

// Upper bound on `-N` suffixes tried before giving up on a taken name.
const MAX_NAME_SUFFIX: u32 = 99;

#[derive(Debug)]
pub enum ExportError {
    Io(io::Error),
    Serde(serde_json::Error),
    SinkUnavailable(&'static str),
}

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serde(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "Export I/O error: {e}"),
            ExportError::Serde(e) => write!(f, "Export serialization error: {e}"),
            ExportError::SinkUnavailable(sink) => write!(f, "Export sink unavailable: {sink}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(e) => Some(e),
            ExportError::Serde(e) => Some(e),
            ExportError::SinkUnavailable(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

pub fn is_valid_export_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'
}

/*
 * Derives a safe file stem from a user-facing base name: a trailing `.json`
 * (any case) is dropped and every character outside `[A-Za-z0-9._-]` becomes
 * `_`. An empty result falls back to the default master file stem.
 */
pub fn sanitize_export_stem(base_name: &str) -> String {
    let trimmed = base_name.trim();
    let without_ext = match trimmed.len().checked_sub(5) {
        Some(cut)
            if trimmed.is_char_boundary(cut)
                && trimmed[cut..].eq_ignore_ascii_case(".json") =>
        {
            &trimmed[..cut]
        }
        _ => trimmed,
    };
    let stem: String = without_ext
        .chars()
        .map(|c| if is_valid_export_name_char(c) { c } else { '_' })
        .collect();
    if stem.is_empty() {
        sanitize_export_stem(MASTER_FILE_DEFAULT)
    } else {
        stem
    }
}

pub fn name_export_file(base_name: &str, version: u64, timestamp: OffsetDateTime) -> String {
    format!(
        "{}_v{:04}_{}.{}",
        sanitize_export_stem(base_name),
        version,
        timestamps::format_file_stamp(timestamp),
        EXPORT_FILE_EXTENSION
    )
}

pub fn render_export_body(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

fn suffixed_name(file_name: &str, n: u32) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{n}.{ext}"),
        None => format!("{file_name}-{n}"),
    }
}

/*
 * Creates `file_name` in `dir` without touching existing files, moving on to
 * a suffixed name while the candidate exists.
 */
pub fn write_new_file(dir: &Path, file_name: &str, body: &[u8]) -> Result<PathBuf> {
    let candidates = std::iter::once(file_name.to_string())
        .chain((2..=MAX_NAME_SUFFIX).map(|n| suffixed_name(file_name, n)));
    for candidate in candidates {
        let path = dir.join(&candidate);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(body)?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                log::debug!("Exporter: {path:?} exists, trying another name.");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(ExportError::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name for '{file_name}'"),
    )))
}

// Where an export ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub sink_name: &'static str,
    pub file_name: String,
    pub path: PathBuf,
}

pub trait ExportSinkOperations {
    fn name(&self) -> &'static str;
    fn is_available(&self) -> bool;
    fn write(&self, file_name: &str, body: &[u8]) -> Result<PathBuf>;
}

/// Always-available sink writing into a download directory.
pub struct DownloadSink {
    dir: PathBuf,
}

impl DownloadSink {
    pub fn new(dir: PathBuf) -> Self {
        DownloadSink { dir }
    }
}

impl ExportSinkOperations for DownloadSink {
    fn name(&self) -> &'static str {
        "download"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn write(&self, file_name: &str, body: &[u8]) -> Result<PathBuf> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        write_new_file(&self.dir, file_name, body)
    }
}

/// Optional sink writing into a user-chosen folder. Unavailable when no folder is set.
pub struct FolderSink {
    dir: Option<PathBuf>,
}

impl FolderSink {
    pub fn new(dir: Option<PathBuf>) -> Self {
        FolderSink { dir }
    }
}

impl ExportSinkOperations for FolderSink {
    fn name(&self) -> &'static str {
        "folder"
    }

    fn is_available(&self) -> bool {
        self.dir.as_ref().is_some_and(|d| d.is_dir())
    }

    fn write(&self, file_name: &str, body: &[u8]) -> Result<PathBuf> {
        let dir = self
            .dir
            .as_ref()
            .filter(|d| d.is_dir())
            .ok_or(ExportError::SinkUnavailable("folder"))?;
        write_new_file(dir, file_name, body)
    }
}

fn receipt(sink: &dyn ExportSinkOperations, path: PathBuf) -> ExportReceipt {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ExportReceipt {
        sink_name: sink.name(),
        file_name,
        path,
    }
}

pub fn write_export(
    preferred: Option<&dyn ExportSinkOperations>,
    fallback: &dyn ExportSinkOperations,
    file_name: &str,
    body: &[u8],
) -> Result<ExportReceipt> {
    if let Some(sink) = preferred {
        if sink.is_available() {
            match sink.write(file_name, body) {
                Ok(path) => {
                    log::info!("Exporter: Wrote {path:?} via {} sink.", sink.name());
                    return Ok(receipt(sink, path));
                }
                Err(e) => log::warn!(
                    "Exporter: {} sink failed for '{file_name}': {e}. Falling back to {}.",
                    sink.name(),
                    fallback.name()
                ),
            }
        } else {
            log::debug!(
                "Exporter: {} sink unavailable, using {}.",
                sink.name(),
                fallback.name()
            );
        }
    }
    let path = fallback.write(file_name, body)?;
    log::info!("Exporter: Wrote {path:?} via {} sink.", fallback.name());
    Ok(receipt(fallback, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;
    use time::Duration;
    use time::macros::datetime;

    struct RecordingSink {
        available: bool,
        fail: bool,
        writes: RefCell<Vec<String>>,
    }

    impl RecordingSink {
        fn new(available: bool, fail: bool) -> Self {
            RecordingSink {
                available,
                fail,
                writes: RefCell::new(Vec::new()),
            }
        }
    }

    impl ExportSinkOperations for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn write(&self, file_name: &str, _body: &[u8]) -> Result<PathBuf> {
            if self.fail {
                return Err(ExportError::Io(io::Error::other("mocked write failure")));
            }
            self.writes.borrow_mut().push(file_name.to_string());
            Ok(PathBuf::from("/mock").join(file_name))
        }
    }

    #[test]
    fn test_name_export_file_format() {
        let moment = datetime!(2024-05-01 10:15:00 UTC);
        assert_eq!(
            name_export_file("Foo.json", 7, moment),
            "Foo_v0007_2024-05-01_101500.json"
        );
        assert_eq!(
            name_export_file("Foo.JSON", 12345, moment),
            "Foo_v12345_2024-05-01_101500.json"
        );
    }

    #[test]
    fn test_sanitize_export_stem() {
        assert_eq!(sanitize_export_stem("My List (copy).json"), "My_List__copy_");
        assert_eq!(sanitize_export_stem("data.v2.json"), "data.v2");
        assert_eq!(sanitize_export_stem("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_export_stem("Grüße"), "Gr__e");
        assert_eq!(sanitize_export_stem(".json"), "MasterListDB");
        assert_eq!(sanitize_export_stem(""), "MasterListDB");
    }

    #[test]
    fn test_names_one_second_apart_differ() {
        let t0 = datetime!(2024-05-01 10:15:00 UTC);
        let a = name_export_file("Foo.json", 7, t0);
        let b = name_export_file("Foo.json", 7, t0 + Duration::seconds(1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_names_at_different_versions_never_collide() {
        let t0 = datetime!(2024-05-01 10:15:00 UTC);
        let v7: Vec<String> = (0..120)
            .map(|s| name_export_file("Foo.json", 7, t0 + Duration::seconds(s)))
            .collect();
        let v8 = name_export_file("Foo.json", 8, t0);
        assert!(v8.starts_with("Foo_v0008_"));
        assert!(!v7.contains(&v8));
    }

    #[test]
    fn test_render_export_body_is_pretty_snapshot() {
        let snapshot = Snapshot {
            schema: 1,
            version: 2,
            updated_at: "2024-05-01T10:00:00+00:00".to_string(),
            categories: vec![vec!["A".to_string(), "b".to_string()]],
        };
        let body = render_export_body(&snapshot).unwrap();
        assert!(body.contains("\n  \"version\": 2"));
        let back: Snapshot = serde_json::from_str(&body).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_write_export_prefers_available_sink() {
        let preferred = RecordingSink::new(true, false);
        let fallback = RecordingSink::new(true, false);

        let receipt = write_export(Some(&preferred), &fallback, "a.json", b"{}").unwrap();

        assert_eq!(receipt.file_name, "a.json");
        assert_eq!(preferred.writes.borrow().len(), 1);
        assert!(fallback.writes.borrow().is_empty());
    }

    #[test]
    fn test_write_export_falls_back_when_unavailable_or_failing() {
        let fallback = RecordingSink::new(true, false);

        let unavailable = RecordingSink::new(false, false);
        write_export(Some(&unavailable), &fallback, "a.json", b"{}").unwrap();
        let failing = RecordingSink::new(true, true);
        write_export(Some(&failing), &fallback, "b.json", b"{}").unwrap();
        write_export(None, &fallback, "c.json", b"{}").unwrap();

        assert!(unavailable.writes.borrow().is_empty());
        assert_eq!(*fallback.writes.borrow(), vec!["a.json", "b.json", "c.json"]);
    }

    #[test]
    fn test_write_export_surfaces_fallback_failure() {
        let failing = RecordingSink::new(true, true);
        let also_failing = RecordingSink::new(true, true);
        assert!(write_export(Some(&failing), &also_failing, "a.json", b"{}").is_err());
    }

    #[test]
    fn test_folder_and_download_sinks_write_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let folder = FolderSink::new(Some(temp_dir.path().join("picked")));
        assert!(!folder.is_available());

        fs::create_dir(temp_dir.path().join("picked")).unwrap();
        assert!(folder.is_available());
        let path = folder.write("x.json", b"{}").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");

        let download = DownloadSink::new(temp_dir.path().join("downloads"));
        let path = download.write("y.json", b"[]").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");

        assert!(!FolderSink::new(None).is_available());
    }

    #[test]
    fn test_sinks_never_replace_an_existing_export() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let download = DownloadSink::new(temp_dir.path().to_path_buf());
        let folder = FolderSink::new(Some(temp_dir.path().to_path_buf()));
        let name = "Foo_v0007_2024-10-27_023000.json";

        let first = download.write(name, b"first").unwrap();
        let second = download.write(name, b"second").unwrap();
        let third = folder.write(name, b"third").unwrap();

        assert_eq!(first, temp_dir.path().join(name));
        assert_eq!(second, temp_dir.path().join("Foo_v0007_2024-10-27_023000-2.json"));
        assert_eq!(third, temp_dir.path().join("Foo_v0007_2024-10-27_023000-3.json"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "first");
        assert_eq!(fs::read_to_string(&second).unwrap(), "second");
        assert_eq!(fs::read_to_string(&third).unwrap(), "third");
    }

    #[test]
    fn test_receipt_names_the_file_actually_written() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let download = DownloadSink::new(temp_dir.path().to_path_buf());
        fs::write(temp_dir.path().join("a.json"), "taken").unwrap();

        let receipt = write_export(None, &download, "a.json", b"{}").unwrap();

        assert_eq!(receipt.file_name, "a-2.json");
        assert_eq!(fs::read_to_string(temp_dir.path().join("a.json")).unwrap(), "taken");
    }

    #[test]
    fn test_suffixed_name() {
        assert_eq!(suffixed_name("Foo_v0001_x.json", 2), "Foo_v0001_x-2.json");
        assert_eq!(suffixed_name("plain", 3), "plain-3");
    }
}
