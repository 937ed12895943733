//! Turns a process record into file-open detections.
//!
//! Pure - no I/O. The engine decides when a record is worth analyzing.

use crate::event::{file_name_of, DetectionStrategy, FileOpenEvent, UNKNOWN_PATH};
use crate::source::ProcessRecord;
use docwatch_readers::{extract_file_names_from_title, extract_file_paths, DocumentExtension};

/// Analyze one process.
///
/// Command-line paths are tagged with `strategy` (ProcessScan or HandleScan);
/// window-title file names are always tagged WindowTitle and carry
/// [`UNKNOWN_PATH`]. Both passes run, so one process can yield events from
/// each.
pub fn analyze_process(record: &ProcessRecord, strategy: DetectionStrategy) -> Vec<FileOpenEvent> {
    let mut events = Vec::new();

    if let Some(command_line) = record.command_line.as_deref() {
        for path in extract_file_paths(command_line) {
            let Some(extension) = DocumentExtension::of(&path) else {
                continue;
            };
            events.push(FileOpenEvent::from_process(
                record,
                &path,
                file_name_of(&path),
                extension,
                strategy,
            ));
        }
    }

    if let Some(title) = record.window_title.as_deref() {
        for name in extract_file_names_from_title(title) {
            let Some(extension) = DocumentExtension::of(&name) else {
                continue;
            };
            events.push(FileOpenEvent::from_process(
                record,
                UNKNOWN_PATH,
                &name,
                extension,
                DetectionStrategy::WindowTitle,
            ));
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ProcessId;

    #[test]
    fn test_command_line_and_title_both_emit() {
        let record = ProcessRecord::new(4242, "WINWORD")
            .with_command_line(r#""C:\Users\a\Doc.docx" /p"#)
            .with_title("Doc.docx - Microsoft Word");

        let events = analyze_process(&record, DetectionStrategy::ProcessScan);
        assert_eq!(events.len(), 2);

        let from_cmd = &events[0];
        assert_eq!(from_cmd.full_path, r"C:\Users\a\Doc.docx");
        assert_eq!(from_cmd.file_name, "Doc.docx");
        assert_eq!(from_cmd.extension, DocumentExtension::Docx);
        assert_eq!(from_cmd.reader, "Microsoft Word");
        assert_eq!(from_cmd.process_id, ProcessId::Pid(4242));
        assert_eq!(from_cmd.strategy, DetectionStrategy::ProcessScan);

        let from_title = &events[1];
        assert!(from_title.has_unknown_path());
        assert_eq!(from_title.file_name, "Doc.docx");
        assert_eq!(from_title.strategy, DetectionStrategy::WindowTitle);
        assert_eq!(
            from_title.window_title.as_deref(),
            Some("Doc.docx - Microsoft Word")
        );
    }

    #[test]
    fn test_handle_scan_tag() {
        let record = ProcessRecord::new(9, "AcroRd32.exe")
            .with_command_line(r#""C:\Program Files\Adobe\AcroRd32.exe" "D:\q3.pdf""#);

        let events = analyze_process(&record, DetectionStrategy::HandleScan);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].full_path, r"D:\q3.pdf");
        assert_eq!(events[0].strategy, DetectionStrategy::HandleScan);
        assert_eq!(events[0].reader, "Adobe Acrobat Reader");
    }

    #[test]
    fn test_nothing_to_report() {
        let record = ProcessRecord::new(1, "chrome").with_title("Inbox - Google Chrome");
        assert!(analyze_process(&record, DetectionStrategy::ProcessScan).is_empty());

        let bare = ProcessRecord::new(1, "chrome");
        assert!(analyze_process(&bare, DetectionStrategy::ProcessScan).is_empty());
    }
}
