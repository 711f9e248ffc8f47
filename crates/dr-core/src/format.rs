//! The source/destination format pair a conversion job handles.

use std::path::{Path, PathBuf};

/// Describes one supported conversion: which extension is accepted, which
/// extension is produced, and how the result is labelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPair {
    /// Source extension without the leading dot, lowercase.
    pub source_ext: &'static str,
    /// Destination extension without the leading dot, lowercase.
    pub dest_ext: &'static str,
    /// MIME type of the converted output.
    pub content_type: &'static str,
}

/// AutoCAD DWG to DXF.
pub const DWG_TO_DXF: FormatPair = FormatPair {
    source_ext: "dwg",
    dest_ext: "dxf",
    content_type: "application/dxf",
};

impl FormatPair {
    /// Whether `filename` ends with `.<source_ext>`, ignoring case.
    pub fn accepts(&self, filename: &str) -> bool {
        let suffix = format!(".{}", self.source_ext);
        let name = filename.as_bytes();
        name.len() >= suffix.len()
            && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
    }

    /// Fixed name of the staged input inside a workspace.
    pub fn input_file_name(&self) -> String {
        format!("input.{}", self.source_ext)
    }

    /// Fixed name of the verified output inside a workspace.
    pub fn output_file_name(&self) -> String {
        format!("output.{}", self.dest_ext)
    }

    /// Where the converter writes its result for a given input: the same
    /// path with the source extension swapped for the destination one.
    pub fn tool_output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(self.dest_ext)
    }

    /// Suggested download name for the converted file.
    ///
    /// Directory components and double quotes are dropped so the value can be
    /// placed into a `Content-Disposition` header as is. A trailing source
    /// extension (any case) is replaced by the destination extension. A name
    /// with nothing before the extension becomes `output.<dest_ext>`.
    pub fn output_filename(&self, uploaded: &str) -> String {
        let base = uploaded
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(uploaded)
            .replace(['"', '\r', '\n'], "");

        match split_ext(&base) {
            Some((stem, ext)) if ext.eq_ignore_ascii_case(self.source_ext) => {
                if stem.is_empty() {
                    self.output_file_name()
                } else {
                    format!("{stem}.{}", self.dest_ext)
                }
            }
            _ if base.is_empty() => self.output_file_name(),
            _ => format!("{base}.{}", self.dest_ext),
        }
    }
}

fn split_ext(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once('.')
}
