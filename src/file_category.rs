/// Extension-based file categorization.
///
/// This module maps file extensions to the closed set of categories that
/// files are sorted into. Lookup is case-insensitive and total: every
/// extension, including the empty one, resolves to a category.
///
/// # Examples
///
/// ```
/// use sortdir::file_category::{Category, classify};
///
/// assert_eq!(classify(".JPG"), Category::Images);
/// assert_eq!(classify("md"), Category::Documents);
/// assert_eq!(classify(""), Category::NoExtension);
/// assert_eq!(classify(".xyz"), Category::Other);
/// ```
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Represents the category directory a file is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Image files (JPG, PNG, SVG, etc.)
    Images,
    /// Video files (MP4, MKV, WEBM, etc.)
    Videos,
    /// Audio files (MP3, FLAC, M4A, etc.)
    Audio,
    /// Office documents and plain text
    Documents,
    /// Compressed and bundled archives
    Archives,
    /// Source code, markup and data files
    Code,
    /// Files whose name carries no extension at all
    NoExtension,
    /// Anything not covered by the table
    Other,
}

impl Category {
    /// Every category, in rule-table order.
    pub const ALL: [Category; 8] = [
        Category::Images,
        Category::Videos,
        Category::Audio,
        Category::Documents,
        Category::Archives,
        Category::Code,
        Category::NoExtension,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "images");
    /// assert_eq!(Category::NoExtension.dir_name(), "no_extension");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Videos => "videos",
            Category::Audio => "audio",
            Category::Documents => "documents",
            Category::Archives => "archives",
            Category::Code => "code",
            Category::NoExtension => "no_extension",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Extensions recognized for each category. Sets are disjoint.
const EXTENSION_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Images,
        &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "tiff"],
    ),
    (Category::Videos, &["mp4", "mov", "mkv", "avi", "webm"]),
    (Category::Audio, &["mp3", "wav", "flac", "aac", "m4a"]),
    (
        Category::Documents,
        &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md"],
    ),
    (Category::Archives, &["zip", "tar", "gz", "tgz", "rar", "7z"]),
    (
        Category::Code,
        &[
            "go", "py", "js", "ts", "java", "c", "cpp", "cs", "html", "css", "json", "yaml",
            "yml", "sh",
        ],
    ),
];

static STANDARD_MAPPER: LazyLock<ExtensionMapper> = LazyLock::new(ExtensionMapper::new);

/// Maps file extensions to categories.
///
/// Keys are stored lowercased and without a leading dot.
#[derive(Debug, Clone)]
pub struct ExtensionMapper {
    extension_map: HashMap<String, Category>,
}

impl ExtensionMapper {
    /// Creates a new `ExtensionMapper` with the standard rule table.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        for (category, extensions) in EXTENSION_TABLE {
            for ext in *extensions {
                mapper.add_extension_mapping(ext, *category);
            }
        }
        mapper
    }

    fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(ext.to_lowercase(), category);
    }

    /// Maps an extension to a category.
    ///
    /// The extension may be given with or without its leading dot.
    /// An empty extension maps to [`Category::NoExtension`] and anything
    /// not in the table maps to [`Category::Other`].
    pub fn categorize(&self, ext: &str) -> Category {
        if ext.is_empty() {
            return Category::NoExtension;
        }
        let bare = ext.strip_prefix('.').unwrap_or(ext);

        self.extension_map
            .get(&bare.to_lowercase())
            .copied()
            .unwrap_or(Category::Other)
    }

    /// Number of extensions known to this mapper.
    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    /// Returns true if the mapper has no extension mappings.
    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }
}

impl Default for ExtensionMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies an extension using the standard rule table.
pub fn classify(extension: &str) -> Category {
    STANDARD_MAPPER.categorize(extension)
}

/// Returns the extension of a file name: the suffix starting at the last
/// `.`, dot included, or `""` when the name has no dot.
///
/// ```
/// use sortdir::file_category::extension_of;
///
/// assert_eq!(extension_of("archive.tar.gz"), ".gz");
/// assert_eq!(extension_of(".bashrc"), ".bashrc");
/// assert_eq!(extension_of("Makefile"), "");
/// ```
pub fn extension_of(file_name: &str) -> &str {
    file_name
        .rfind('.')
        .map(|idx| &file_name[idx..])
        .unwrap_or("")
}
