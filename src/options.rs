//! Per-buffer editing options.

/// Line ending convention of a buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// `\n`
    #[default]
    Unix,
    /// `\r\n`
    Windows,
    /// `\r`
    Mac,
}

impl FileFormat {
    /// The line terminator written between lines.
    #[must_use]
    pub fn line_ending(self) -> &'static str {
        match self {
            Self::Unix => "\n",
            Self::Windows => "\r\n",
            Self::Mac => "\r",
        }
    }

    /// Detect the format from the first line ending found in `text`.
    ///
    /// Text without any line ending yields `None`.
    #[must_use]
    pub fn detect(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let pos = bytes.iter().position(|&b| b == b'\n' || b == b'\r')?;
        if bytes[pos] == b'\n' {
            Some(Self::Unix)
        } else if bytes.get(pos + 1) == Some(&b'\n') {
            Some(Self::Windows)
        } else {
            Some(Self::Mac)
        }
    }
}

/// Default maximum number of undo entries to retain.
pub const DEFAULT_MAX_HISTORY_DEPTH: usize = 1000;

/// Editing options attached to a [`TextBuffer`](crate::text::TextBuffer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextOptions {
    /// Visual width of a tab character.
    pub tab_stop: usize,
    /// Width added or removed by one indent step.
    pub shift_width: usize,
    /// Indent with spaces instead of tabs.
    pub expand_tab: bool,
    /// Line ending used for new buffers without a detected format.
    pub file_format: FileFormat,
    /// Maximum number of undo entries. Oldest entries are dropped when exceeded.
    pub max_history_depth: usize,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            tab_stop: 4,
            shift_width: 4,
            expand_tab: true,
            file_format: FileFormat::Unix,
            max_history_depth: DEFAULT_MAX_HISTORY_DEPTH,
        }
    }
}

impl TextOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set tab stop (builder pattern). Zero is treated as one.
    #[must_use]
    pub fn with_tab_stop(mut self, tab_stop: usize) -> Self {
        self.tab_stop = tab_stop.max(1);
        self
    }

    /// Set shift width (builder pattern). Zero is treated as one.
    #[must_use]
    pub fn with_shift_width(mut self, shift_width: usize) -> Self {
        self.shift_width = shift_width.max(1);
        self
    }

    /// Set whether indentation uses spaces (builder pattern).
    #[must_use]
    pub fn with_expand_tab(mut self, expand_tab: bool) -> Self {
        self.expand_tab = expand_tab;
        self
    }

    /// Set the default file format (builder pattern).
    #[must_use]
    pub fn with_file_format(mut self, file_format: FileFormat) -> Self {
        self.file_format = file_format;
        self
    }

    /// Set the undo history bound (builder pattern).
    #[must_use]
    pub fn with_max_history_depth(mut self, depth: usize) -> Self {
        self.max_history_depth = depth;
        self
    }

    /// The whitespace inserted by one indent step, exactly `shift_width`
    /// columns wide when placed at column 0.
    #[must_use]
    pub fn indent_unit(&self) -> String {
        crate::text::indent::indent_string(self.shift_width, self)
    }
}
