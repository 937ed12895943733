//! Reader applications and document path extraction for docwatch.
//!
//! Pure domain logic, no I/O and no platform dependencies:
//! - `registry.rs` - process image name to reader label lookup
//! - `extension.rs` - the supported document extension set
//! - `extract.rs` - command-line and window-title scanners
//!
//! # Example
//!
//! ```
//! use docwatch_readers::{extract_file_paths, resolve_reader_label};
//!
//! let paths = extract_file_paths(r#""C:\Users\a\Doc.docx" /p"#);
//! assert_eq!(paths, vec![r"C:\Users\a\Doc.docx".to_string()]);
//! assert_eq!(resolve_reader_label("WINWORD.EXE"), "Microsoft Word");
//! ```

mod extension;
mod extract;
mod registry;

pub use extension::{DocumentExtension, SUPPORTED_EXTENSIONS};
pub use extract::{extract_file_names_from_title, extract_file_paths};
pub use registry::{
    is_reader_process, resolve_reader_label, READER_LABELS, READER_PROCESS_PATTERN,
};
