//! Reader application registry.
//!
//! Pure lookup - no I/O, no platform dependencies.

use regex::Regex;
use std::sync::LazyLock;

/// Process image names mapped to human-readable reader labels.
pub const READER_LABELS: &[(&str, &str)] = &[
    ("AcroRd32.exe", "Adobe Acrobat Reader"),
    ("Acrobat.exe", "Adobe Acrobat"),
    ("WINWORD.exe", "Microsoft Word"),
    ("chrome.exe", "Google Chrome"),
    ("msedge.exe", "Microsoft Edge"),
    ("firefox.exe", "Mozilla Firefox"),
    ("FoxitPDFReader.exe", "Foxit PDF Reader"),
    ("FoxitReader.exe", "Foxit Reader"),
    ("SumatraPDF.exe", "SumatraPDF"),
];

/// Allow-list of reader process names. Case-sensitive, matched anywhere in the name.
///
/// Shared with shell-side filters, so it must stay valid in both the `regex`
/// crate and .NET regular expressions.
pub const READER_PROCESS_PATTERN: &str =
    "AcroRd32|Acrobat|WINWORD|chrome|msedge|firefox|Foxit|SumatraPDF";

static READER_PROCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(READER_PROCESS_PATTERN).expect("reader allow-list pattern"));

/// Resolve a process image name to a reader label.
///
/// Tries the name as given, then with an `.exe` suffix. Unknown names are
/// returned unchanged.
pub fn resolve_reader_label(image_name: &str) -> String {
    let with_exe = format!("{image_name}.exe");

    [image_name, with_exe.as_str()]
        .iter()
        .find_map(|candidate| {
            READER_LABELS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(candidate))
                .map(|(_, label)| *label)
        })
        .map(String::from)
        .unwrap_or_else(|| image_name.to_string())
}

/// Whether a process image name belongs to a known document reader.
pub fn is_reader_process(image_name: &str) -> bool {
    READER_PROCESS.is_match(image_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_name() {
        assert_eq!(resolve_reader_label("WINWORD.EXE"), "Microsoft Word");
        assert_eq!(resolve_reader_label("AcroRd32.exe"), "Adobe Acrobat Reader");
    }

    #[test]
    fn test_name_without_suffix() {
        // Get-Process reports names without the .exe suffix
        assert_eq!(resolve_reader_label("msedge"), "Microsoft Edge");
        assert_eq!(resolve_reader_label("SumatraPDF"), "SumatraPDF");
    }

    #[test]
    fn test_unknown_falls_back_to_raw_name() {
        assert_eq!(resolve_reader_label("unknownapp.exe"), "unknownapp.exe");
        assert_eq!(resolve_reader_label(""), "");
    }

    #[test]
    fn test_allow_list() {
        assert!(is_reader_process("AcroRd32"));
        assert!(is_reader_process("FoxitPDFReader"));
        assert!(is_reader_process("chrome"));
        assert!(!is_reader_process("explorer"));
        assert!(!is_reader_process("Chrome"));
    }

    #[test]
    fn test_every_registered_reader_is_allowed() {
        for (name, _) in READER_LABELS {
            let stem = name.trim_end_matches(".exe");
            assert!(is_reader_process(stem), "{stem} missing from allow-list");
        }
    }
}
