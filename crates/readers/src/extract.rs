//! Document path extraction from command lines and window titles.
//!
//! Pure string scanning - callers decide what to do with the candidates.
//! Every pattern requires the extension to be followed by end of text,
//! whitespace, a quote or one of `) ] ,`, so `a.pdf.bak` is not a document.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// `"C:\path with spaces\file.pdf"` - the path inside the quotes.
static QUOTED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"([^"\r\n]+?\.(?:docx|doc|pdf))""#).expect("quoted path pattern")
});

/// `C:\path\file.pdf` - unquoted drive-letter absolute path. May start too
/// early on a line with several arguments; see [`argument_start`].
static DRIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b([a-z]:\\[^"<>|\r\n]*?\.(?:docx|doc|pdf))(?:$|[\s"),\]])"#)
        .expect("drive path pattern")
});

/// `file.pdf`, `./dir/file.pdf` - any whitespace-delimited token.
static BARE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([^\s"]+\.(?:docx|doc|pdf))(?:$|[\s"),\]])"#).expect("bare path pattern")
});

/// `name.pdf` inside a window title, no directory part.
static TITLE_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([^\s\\/:*?"<>|\[\]]+\.(?:docx|doc|pdf))(?:$|[\s"),\]])"#)
        .expect("title file name pattern")
});

/// A whole title segment that is a file name, spaces allowed.
static TITLE_SEGMENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^[^\\/:*?"<>|\[\]]+\.(?:docx|doc|pdf)$"#).expect("title segment pattern")
});

/// Separator between document and application in reader window titles.
const TITLE_SEPARATOR: &str = " - ";

/// Extract candidate document paths from a process command line.
///
/// Three passes run in order: quoted paths, drive-letter absolute paths,
/// then bare whitespace-delimited tokens. Results keep first-seen order and
/// each distinct path appears once. A later-pass hit lying inside the text
/// of an earlier hit (e.g. the tail of an unquoted path with spaces) is
/// dropped.
pub fn extract_file_paths(command_line: &str) -> Vec<String> {
    let quoted = QUOTED_PATH
        .captures_iter(command_line)
        .filter_map(|c| c.get(1))
        .map(|m| m.range());
    let drive = DRIVE_PATH
        .captures_iter(command_line)
        .filter_map(|c| c.get(1))
        .map(|m| m.start() + argument_start(m.as_str())..m.end());
    let bare = BARE_PATH
        .captures_iter(command_line)
        .filter_map(|c| c.get(1))
        .map(|m| m.range());

    let mut accepted: Vec<Range<usize>> = Vec::new();
    let mut paths: Vec<String> = Vec::new();

    for span in quoted.chain(drive).chain(bare) {
        let candidate = command_line[span.clone()].trim();
        if candidate.is_empty() {
            continue;
        }
        let covered = accepted
            .iter()
            .any(|a| a.start <= span.start && span.end <= a.end);
        if covered || paths.iter().any(|p| p == candidate) {
            continue;
        }
        paths.push(candidate.to_string());
        accepted.push(span);
    }

    paths
}

/// Offset where the last argument in `span` begins.
///
/// An unquoted drive path may contain spaces, but a following drive letter,
/// a switch (`/x`, `-x`) or a preceding `.exe` token starts a new argument.
fn argument_start(span: &str) -> usize {
    let mut start = 0;

    for (i, c) in span.char_indices() {
        if !c.is_whitespace() {
            continue;
        }
        let next = i + c.len_utf8();
        let rest = &span[next..];
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            continue;
        }
        if starts_argument(rest) || ends_with_exe(span[..i].trim_end()) {
            start = next;
        }
    }

    start
}

fn starts_argument(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    let drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && bytes[2] == b'\\';
    let switch = matches!(bytes.first(), Some(b'/' | b'-'))
        && bytes.get(1).is_some_and(|b| !b.is_ascii_whitespace());
    drive || switch
}

fn ends_with_exe(token: &str) -> bool {
    token
        .get(token.len().saturating_sub(4)..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case(".exe"))
}

/// Extract document file names from a window title, in order of appearance.
///
/// Readers typically show `report.pdf - Adobe Acrobat Reader` or
/// `Doc.docx - Microsoft Word`. A ` - ` separated segment that is entirely a
/// file name is returned whole, spaces included; other segments are scanned
/// for bare `name.ext` tokens.
pub fn extract_file_names_from_title(title: &str) -> Vec<String> {
    let mut names = Vec::new();

    for segment in title.split(TITLE_SEPARATOR) {
        let segment = segment.trim();
        if TITLE_SEGMENT_NAME.is_match(segment) {
            names.push(segment.to_string());
            continue;
        }
        names.extend(
            TITLE_FILE_NAME
                .captures_iter(segment)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().to_string()),
        );
    }

    names
}
