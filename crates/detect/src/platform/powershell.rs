//! Windows process and shortcut queries through PowerShell.

use crate::error::SourceError;
use crate::source::{ProcessQuery, ProcessRecord, ProcessSnapshotSource};
use async_trait::async_trait;
use docwatch_readers::READER_PROCESS_PATTERN;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

/// Run a PowerShell script and return its stdout.
pub(crate) async fn run_powershell(script: &str, timeout: Duration) -> Result<String, SourceError> {
    let mut cmd = tokio::process::Command::new("powershell");
    cmd.args(["-NoProfile", "-NonInteractive", "-Command", script])
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| SourceError::Timeout(timeout))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::CommandNotFound("powershell".to_string())
            } else {
                SourceError::ExecutionFailed(e.to_string())
            }
        })?;

    if !output.status.success() {
        return Err(SourceError::NonZeroExit {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `ConvertTo-Json` emits a bare object for one result and an array for many.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Parse `ConvertTo-Json` output. Empty output is an empty list.
pub(crate) fn parse_json_records<T: DeserializeOwned>(stdout: &str) -> Result<Vec<T>, SourceError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<OneOrMany<T>>(trimmed) {
        Ok(OneOrMany::One(record)) => Ok(vec![record]),
        Ok(OneOrMany::Many(records)) => Ok(records),
        Err(e) => Err(SourceError::Parse(e.to_string())),
    }
}

/// Quote a string as a PowerShell single-quoted literal.
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Escape `-like` wildcard characters.
fn escape_wildcards(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '`') {
            escaped.push('`');
        }
        escaped.push(c);
    }
    escaped
}

/// Row of `Get-Process | Select-Object Id,ProcessName,MainWindowTitle`.
#[derive(Debug, Deserialize)]
struct WindowRow {
    #[serde(rename = "Id")]
    id: u32,
    #[serde(rename = "ProcessName")]
    name: String,
    #[serde(rename = "MainWindowTitle", default)]
    title: Option<String>,
}

/// Row of `Get-CimInstance Win32_Process | Select-Object ProcessId,Name,CommandLine`.
#[derive(Debug, Deserialize)]
struct CommandLineRow {
    #[serde(rename = "ProcessId")]
    id: u32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CommandLine", default)]
    command_line: Option<String>,
}

/// Row of `Get-CimInstance Win32_Process | Select-Object ProcessId,CommandLine`.
#[derive(Debug, Deserialize)]
struct PidCommandLine {
    #[serde(rename = "ProcessId")]
    id: u32,
    #[serde(rename = "CommandLine", default)]
    command_line: Option<String>,
}

fn windowed_readers_script() -> String {
    format!(
        "Get-Process | Where-Object {{ $_.ProcessName -cmatch {} -and $_.MainWindowTitle -ne '' }} \
         | Select-Object Id,ProcessName,MainWindowTitle | ConvertTo-Json -Compress",
        quote_literal(READER_PROCESS_PATTERN)
    )
}

fn reader_command_lines_script() -> String {
    format!(
        "Get-CimInstance Win32_Process | Where-Object {{ $_.Name -cmatch {} -and $_.CommandLine -match '\\.(pdf|docx?)\\b' }} \
         | Select-Object ProcessId,Name,CommandLine | ConvertTo-Json -Compress",
        quote_literal(READER_PROCESS_PATTERN)
    )
}

fn title_or_reader_script(file_name: &str) -> String {
    let pattern = format!("*{}*", escape_wildcards(file_name));
    format!(
        "Get-Process | Where-Object {{ $_.MainWindowTitle -like {} -or $_.ProcessName -cmatch {} }} \
         | Select-Object Id,ProcessName,MainWindowTitle | ConvertTo-Json -Compress",
        quote_literal(&pattern),
        quote_literal(READER_PROCESS_PATTERN)
    )
}

/// One `Win32_Process` query for every pid in the batch.
fn command_lines_script(pids: &[u32]) -> String {
    let filter = pids
        .iter()
        .map(|pid| format!("ProcessId={pid}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!(
        "Get-CimInstance Win32_Process -Filter \"{filter}\" \
         | Select-Object ProcessId,CommandLine | ConvertTo-Json -Compress"
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Process snapshots from `Get-Process` and `Win32_Process`.
#[derive(Debug, Clone)]
pub struct PowerShellProcessSource {
    timeout: Duration,
}

impl PowerShellProcessSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn windows(&self, script: &str) -> Result<Vec<ProcessRecord>, SourceError> {
        let stdout = run_powershell(script, self.timeout).await?;
        let rows: Vec<WindowRow> = parse_json_records(&stdout)?;

        Ok(rows
            .into_iter()
            .map(|row| ProcessRecord {
                pid: row.id,
                name: row.name,
                window_title: non_empty(row.title),
                command_line: None,
            })
            .collect())
    }

    /// Fill in command lines with one batched lookup. A failed lookup
    /// leaves them absent; it is not an error for the snapshot.
    async fn attach_command_lines(&self, records: &mut [ProcessRecord]) {
        if records.is_empty() {
            return;
        }

        let pids: Vec<u32> = records.iter().map(|r| r.pid).collect();
        let rows = run_powershell(&command_lines_script(&pids), self.timeout)
            .await
            .and_then(|stdout| parse_json_records::<PidCommandLine>(&stdout));

        match rows {
            Ok(rows) => apply_command_lines(records, rows),
            Err(e) => tracing::debug!(count = pids.len(), error = %e, "Command line lookup failed"),
        }
    }
}

fn apply_command_lines(records: &mut [ProcessRecord], rows: Vec<PidCommandLine>) {
    let mut by_pid: HashMap<u32, Option<String>> = rows
        .into_iter()
        .map(|row| (row.id, non_empty(row.command_line)))
        .collect();

    for record in records {
        record.command_line = by_pid.remove(&record.pid).flatten();
    }
}

#[async_trait]
impl ProcessSnapshotSource for PowerShellProcessSource {
    async fn snapshot(&self, query: &ProcessQuery) -> Result<Vec<ProcessRecord>, SourceError> {
        let mut records = match query {
            ProcessQuery::WindowedReaders => self.windows(&windowed_readers_script()).await?,
            ProcessQuery::TitleOrReader { file_name } => {
                self.windows(&title_or_reader_script(file_name)).await?
            }
            ProcessQuery::ReaderCommandLines => {
                let stdout = run_powershell(&reader_command_lines_script(), self.timeout).await?;
                let rows: Vec<CommandLineRow> = parse_json_records(&stdout)?;
                rows.into_iter()
                    .map(|row| ProcessRecord {
                        pid: row.id,
                        name: row.name,
                        window_title: None,
                        command_line: non_empty(row.command_line),
                    })
                    .collect()
            }
        };

        records.retain(|record| query.matches(record));

        if matches!(query, ProcessQuery::WindowedReaders) {
            self.attach_command_lines(&mut records).await;
        }

        Ok(records)
    }
}

/// Resolve a `.lnk` shortcut to its target path.
pub(crate) async fn resolve_shortcut(
    link: &std::path::Path,
    timeout: Duration,
) -> Result<Option<std::path::PathBuf>, SourceError> {
    let script = format!(
        "(New-Object -ComObject WScript.Shell).CreateShortcut({}).TargetPath",
        quote_literal(&link.to_string_lossy())
    );
    let stdout = run_powershell(&script, timeout).await?;
    Ok(non_empty(Some(stdout)).map(std::path::PathBuf::from))
}
