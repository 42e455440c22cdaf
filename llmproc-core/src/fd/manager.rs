//! File-descriptor manager: creates, paginates, extracts, and exports
//! out-of-band content handles (spec §4.B).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::pagination::{self, Page};

/// `{ fd_id, content, page_size, total_pages, total_lines, creation_source }`
/// (spec §3). Content is immutable once created.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub fd_id: String,
    pub content: String,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_lines: usize,
    pub creation_source: String,
    pages: Vec<Page>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Page,
    Line,
    Char,
}

impl std::str::FromStr for ReadMode {
    type Err = FdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page" => Ok(Self::Page),
            "line" => Ok(Self::Line),
            "char" => Ok(Self::Char),
            other => Err(FdError::ReadError(format!("unknown read mode: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Write,
    Append,
}

impl std::str::FromStr for WriteMode {
    type Err = FdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "write" => Ok(Self::Write),
            "append" => Ok(Self::Append),
            other => Err(FdError::WriteError(format!("unknown write mode: {other}"))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FdError {
    #[error("file descriptor not found: {0}")]
    NotFound(String),
    #[error("invalid page: start {start} exceeds total {total}")]
    InvalidPage { start: usize, total: usize },
    #[error("file already exists: {}", .0.display())]
    FileExists(PathBuf),
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("write error: {0}")]
    WriteError(String),
    #[error("read error: {0}")]
    ReadError(String),
}

impl FdError {
    /// The `<fd_error type="...">` discriminant named in spec §4.B/§7.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidPage { .. } => "invalid_page",
            Self::FileExists(_) => "file_exists",
            Self::FileNotFound(_) => "file_not_found",
            Self::WriteError(_) => "write_error",
            Self::ReadError(_) => "read_error",
        }
    }

    /// Render as the structured payload a [`crate::tool_result::ToolResult`]
    /// error envelope carries (spec §7).
    pub fn to_envelope(&self, fd_id: &str) -> String {
        format!(
            "<fd_error type=\"{}\" fd=\"{}\">{}</fd_error>",
            self.error_type(),
            fd_id,
            self
        )
    }
}

/// Outcome of [`FileDescriptorManager::read_fd`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Content(String),
    NewFd { fd_id: String, preview: String },
}

#[derive(Clone)]
pub struct FileDescriptorManager {
    fds: HashMap<String, FileDescriptor>,
    next_id: u64,
    default_page_size: usize,
    enable_references: bool,
    fd_tool_names: HashSet<String>,
}

impl FileDescriptorManager {
    pub fn new(default_page_size: usize, enable_references: bool) -> Self {
        Self {
            fds: HashMap::new(),
            next_id: 1,
            default_page_size,
            enable_references,
            fd_tool_names: HashSet::new(),
        }
    }

    /// Marks a tool name whose outputs must not be auto-wrapped into an FD
    /// (prevents recursion: reading an FD cannot itself create a wrapping FD).
    pub fn register_fd_tool(&mut self, name: impl Into<String>) {
        self.fd_tool_names.insert(name.into());
    }

    pub fn is_fd_tool(&self, name: &str) -> bool {
        self.fd_tool_names.contains(name)
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    /// Allocates a new content FD (`fd:<n>`) for `content`.
    pub fn create_fd(&mut self, content: impl Into<String>, creation_source: &str) -> String {
        self.create_fd_with_id(content, creation_source, None)
    }

    fn create_fd_with_id(
        &mut self,
        content: impl Into<String>,
        creation_source: &str,
        forced_id: Option<String>,
    ) -> String {
        let content = content.into();
        let pages = pagination::paginate(&content, self.default_page_size);
        let total_lines = pagination::count_lines(&content);
        let fd_id = match forced_id {
            Some(id) => {
                if let Some(n) = id.strip_prefix("fd:").and_then(|n| n.parse::<u64>().ok()) {
                    self.next_id = self.next_id.max(n + 1);
                }
                id
            }
            None => {
                let id = format!("fd:{}", self.next_id);
                self.next_id += 1;
                id
            }
        };
        let fd = FileDescriptor {
            fd_id: fd_id.clone(),
            content,
            page_size: self.default_page_size,
            total_pages: pages.len(),
            total_lines,
            creation_source: creation_source.to_owned(),
            pages,
        };
        self.fds.insert(fd_id.clone(), fd);
        fd_id
    }

    /// Copies a foreign `fd_id` into this manager under its original id,
    /// preserving content and pagination (`spawn`'s `additional_preload_fds`,
    /// spec §4.E).
    pub fn import_fd(&mut self, fd_id: &str, content: impl Into<String>, creation_source: &str) {
        self.create_fd_with_id(content, creation_source, Some(fd_id.to_string()));
    }

    /// A reference FD is created by upstream tools that extract named
    /// regions of content (spec §4.B "Reference FDs"); `name` becomes
    /// `ref:<name>`. Only accepted when `enable_references` is set.
    pub fn create_reference_fd(
        &mut self,
        name: &str,
        content: impl Into<String>,
        creation_source: &str,
    ) -> Result<String, FdError> {
        if !self.enable_references {
            return Err(FdError::WriteError(
                "reference FDs are disabled for this process".to_owned(),
            ));
        }
        let fd_id = format!("ref:{name}");
        Ok(self.create_fd_with_id(content, creation_source, Some(fd_id)))
    }

    pub fn get(&self, fd_id: &str) -> Result<&FileDescriptor, FdError> {
        self.fds
            .get(fd_id)
            .ok_or_else(|| FdError::NotFound(fd_id.to_owned()))
    }

    /// Renders the standard `create_fd` success body: the new id, page
    /// count, line count, and a preview of page 1 (spec §4.B).
    pub fn creation_envelope(&self, fd_id: &str) -> Result<String, FdError> {
        let fd = self.get(fd_id)?;
        let preview = fd.pages.first().map(|p| p.content.as_str()).unwrap_or("");
        Ok(format!(
            "<fd_result fd=\"{}\" total_pages=\"{}\" total_lines=\"{}\">\n{}\n</fd_result>",
            fd.fd_id, fd.total_pages, fd.total_lines, preview
        ))
    }

    fn lines_of(content: &str) -> Vec<&str> {
        content.split_inclusive('\n').collect()
    }

    fn select_range(
        fd: &FileDescriptor,
        mode: ReadMode,
        start: usize,
        count: usize,
    ) -> Result<String, FdError> {
        let count = count.max(1);
        match mode {
            ReadMode::Page => {
                if start == 0 || start > fd.total_pages {
                    return Err(FdError::InvalidPage {
                        start,
                        total: fd.total_pages,
                    });
                }
                let end = (start + count - 1).min(fd.total_pages);
                Ok(fd.pages[(start - 1)..end].iter().map(|p| p.content.as_str()).collect())
            }
            ReadMode::Line => {
                if start == 0 || start > fd.total_lines {
                    return Err(FdError::InvalidPage {
                        start,
                        total: fd.total_lines,
                    });
                }
                let lines = Self::lines_of(&fd.content);
                let end = (start + count - 1).min(lines.len());
                Ok(lines[(start - 1)..end].concat())
            }
            ReadMode::Char => {
                let total_chars = fd.content.chars().count();
                if start >= total_chars && total_chars > 0 {
                    return Err(FdError::InvalidPage {
                        start,
                        total: total_chars,
                    });
                }
                let end = (start + count).min(total_chars);
                Ok(fd.content.chars().skip(start).take(end - start).collect())
            }
        }
    }

    /// `read_fd(fd_id, mode, start, count, read_all?, extract_to_new_fd?)`
    /// (spec §4.B operation contract).
    pub fn read_fd(
        &mut self,
        fd_id: &str,
        mode: ReadMode,
        start: usize,
        count: usize,
        read_all: bool,
        extract_to_new_fd: bool,
    ) -> Result<ReadOutcome, FdError> {
        let selected = {
            let fd = self.get(fd_id)?;
            if read_all {
                fd.content.clone()
            } else {
                Self::select_range(fd, mode, start, count)?
            }
        };

        if extract_to_new_fd {
            let source = format!("extract:{fd_id}");
            let new_id = self.create_fd(selected, &source);
            let preview = self.creation_envelope(&new_id)?;
            Ok(ReadOutcome::NewFd {
                fd_id: new_id,
                preview,
            })
        } else {
            Ok(ReadOutcome::Content(selected))
        }
    }

    /// `write_fd_to_file(fd_id, path, mode, create, exist_ok)` (spec §4.B),
    /// applying the `create`/`exist_ok` policy matrix verbatim.
    pub async fn write_fd_to_file(
        &self,
        fd_id: &str,
        path: &Path,
        mode: WriteMode,
        create: bool,
        exist_ok: bool,
    ) -> Result<String, FdError> {
        let fd = self.get(fd_id)?;
        let exists = tokio::fs::metadata(path).await.is_ok();

        if exists && !exist_ok {
            return Err(FdError::FileExists(path.to_path_buf()));
        }
        if !exists && !create {
            return Err(FdError::FileNotFound(path.to_path_buf()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| FdError::WriteError(e.to_string()))?;
            }
        }

        match mode {
            WriteMode::Write => tokio::fs::write(path, &fd.content)
                .await
                .map_err(|e| FdError::WriteError(e.to_string()))?,
            WriteMode::Append => {
                use tokio::io::AsyncWriteExt;
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .map_err(|e| FdError::WriteError(e.to_string()))?;
                file.write_all(fd.content.as_bytes())
                    .await
                    .map_err(|e| FdError::WriteError(e.to_string()))?;
            }
        }

        Ok(format!(
            "wrote fd {} ({} bytes) to {}",
            fd_id,
            fd.content.len(),
            path.display()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> FileDescriptorManager {
        FileDescriptorManager::new(100, true)
    }

    #[test]
    fn create_then_read_all_round_trips() {
        let content = (1..=50)
            .map(|n| format!("Line {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut mgr = manager();
        let id = mgr.create_fd(content.clone(), "tool:test");
        let fd = mgr.get(&id).unwrap();
        assert!(fd.total_pages >= 2);

        let outcome = mgr
            .read_fd(&id, ReadMode::Page, 1, 1, true, false)
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Content(content));
    }

    #[test]
    fn read_first_page_starts_with_first_line() {
        let content = (1..=50)
            .map(|n| format!("Line {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut mgr = manager();
        let id = mgr.create_fd(content, "tool:test");
        let outcome = mgr
            .read_fd(&id, ReadMode::Page, 1, 1, false, false)
            .unwrap();
        match outcome {
            ReadOutcome::Content(c) => {
                assert!(c.len() <= 100);
                assert!(c.starts_with("Line 1"));
            }
            _ => panic!("expected inline content"),
        }
    }

    #[test]
    fn invalid_page_start_errors() {
        let mut mgr = manager();
        let id = mgr.create_fd("short", "tool:test");
        let err = mgr
            .read_fd(&id, ReadMode::Page, 99, 1, false, false)
            .unwrap_err();
        assert_eq!(err.error_type(), "invalid_page");
    }

    #[test]
    fn not_found_errors() {
        let mut mgr = manager();
        let err = mgr
            .read_fd("fd:999", ReadMode::Page, 1, 1, false, false)
            .unwrap_err();
        assert_eq!(err.error_type(), "not_found");
    }

    #[test]
    fn extract_to_new_fd_matches_direct_range() {
        let content = (1..=50)
            .map(|n| format!("Line {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut mgr = manager();
        let id = mgr.create_fd(content, "tool:test");

        let direct = match mgr.read_fd(&id, ReadMode::Line, 1, 5, false, false).unwrap() {
            ReadOutcome::Content(c) => c,
            _ => unreachable!(),
        };

        let new_id = match mgr
            .read_fd(&id, ReadMode::Line, 1, 5, false, true)
            .unwrap()
        {
            ReadOutcome::NewFd { fd_id, .. } => fd_id,
            _ => unreachable!(),
        };
        let extracted = match mgr
            .read_fd(&new_id, ReadMode::Page, 1, 1, true, false)
            .unwrap()
        {
            ReadOutcome::Content(c) => c,
            _ => unreachable!(),
        };
        assert_eq!(direct, extracted);
    }
}
