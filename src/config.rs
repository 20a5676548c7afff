use codecursor_mask::Delimiters;

use crate::EditError;

/// Keywords that mark the start of the next member for
/// [`SourceFile::find_end_of_member`](crate::SourceFile::find_end_of_member).
pub const DEFAULT_MEMBER_MARKERS: [&str; 4] = ["public", "internal", "protected", "private"];

/// Settings consumed once when a [`SourceFile`](crate::SourceFile) is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub delimiters: Delimiters,
    pub member_markers: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            member_markers: DEFAULT_MEMBER_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EditorConfig {
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Parse delimiters from their comma-separated text form (see [`Delimiters`]).
    pub fn with_delimiter_text(self, text: &str) -> Result<Self, EditError> {
        Ok(self.with_delimiters(text.parse()?))
    }

    pub fn with_member_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.member_markers = markers.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_recognises_c_style_delimiters() {
        let cfg = EditorConfig::default();
        assert_eq!(cfg.delimiters, Delimiters::default());
        assert_eq!(cfg.member_markers.len(), 4);
    }

    #[test]
    fn delimiter_text_errors_surface_as_edit_errors() {
        let err = EditorConfig::default().with_delimiter_text("//,//").unwrap_err();
        assert!(matches!(err, EditError::Delimiters(_)));
    }

    #[test]
    fn member_markers_can_be_replaced() {
        let cfg = EditorConfig::default().with_member_markers(["fn ", "pub fn "]);
        assert_eq!(cfg.member_markers, vec!["fn ", "pub fn "]);
    }
}
