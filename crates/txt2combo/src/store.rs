//! Text resources on disk
//!
//! A [Store] owns a storage root. Resource identifiers are sanitized into file names inside that root, anything that
//! would resolve outside of it is rejected. Writes go to a temporary file next to the target and are renamed into
//! place, so concurrent readers see either the old or the new content.
use crate::validate::{validate, ValidationErrors};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

pub const EXTENSION: &str = "txt";

/// Resource written by [Store::seed_example]
pub const EXAMPLE: &str = "example.txt";

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Overwrite,
    Append,
    /// only create, never touch an existing resource
    #[default]
    Populate,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Overwrite => f.write_str("overwrite"),
            WriteMode::Append => f.write_str("append"),
            WriteMode::Populate => f.write_str("populate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WriteOutcome {
    pub filename: String,
    pub is_new: bool,
    /// [WriteMode::Append] on a missing resource is reported as [WriteMode::Overwrite]
    pub mode_used: WriteMode,
}

/// Result of [Store::save] as reported to a host
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub outcome: Option<WriteOutcome>,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open a store, creating the root directory when missing
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File names of all resources, sorted
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = vec![];

        for dir_entry in std::fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let file_name = dir_entry.file_name().to_string_lossy().into_owned();
            if file_name.ends_with(&format!(".{EXTENSION}")) {
                names.push(file_name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Sanitized file name and full path of a resource
    pub fn locate(&self, resource: &str) -> Result<(String, PathBuf), StoreError> {
        let mut file_name = sanitize(resource);
        if file_name.is_empty() {
            return Err(StoreError::InvalidFilename(resource.to_string()));
        }

        if !file_name
            .to_lowercase()
            .ends_with(&format!(".{EXTENSION}"))
        {
            file_name = format!("{file_name}.{EXTENSION}");
        }

        // a single plain component, no `..` or `.`
        let mut components = Path::new(&file_name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal {
            return Err(StoreError::PathTraversal(resource.to_string()));
        }

        let path = self.root.join(&file_name);
        if path.exists() {
            // symlinks must not lead out of the root either
            let root = self.root.canonicalize()?;
            if !path.canonicalize()?.starts_with(root) {
                return Err(StoreError::PathTraversal(resource.to_string()));
            }
        }

        Ok((file_name, path))
    }

    pub fn exists(&self, resource: &str) -> Result<bool, StoreError> {
        Ok(self.locate(resource)?.1.is_file())
    }

    pub fn read(&self, resource: &str) -> Result<String, StoreError> {
        let (file_name, path) = self.locate(resource)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(file_name));
        }

        tracing::info!(path = %path.display(), "reading resource");
        Ok(std::fs::read_to_string(&path)?)
    }

    /// Write without validation. Content is normalized: lines trimmed, blank lines dropped.
    pub fn write(
        &self,
        resource: &str,
        text: &str,
        mode: WriteMode,
    ) -> Result<WriteOutcome, StoreError> {
        let (file_name, path) = self.locate(resource)?;
        let is_new = !path.exists();

        if mode == WriteMode::Populate && !is_new {
            return Err(StoreError::Exists(file_name));
        }

        let text = normalize(text);
        let (content, mode_used) = if mode == WriteMode::Append && !is_new {
            let mut existing = std::fs::read_to_string(&path)?;
            if !existing.is_empty() && !existing.ends_with('\n') {
                existing.push('\n');
            }
            existing.push_str(&text);
            (existing, WriteMode::Append)
        } else {
            (text, WriteMode::Overwrite)
        };

        if mode == WriteMode::Populate {
            self.create(&path, &file_name, &content)?;
        } else {
            self.replace(&path, &content)?;
        }
        tracing::info!(path = %path.display(), mode = %mode_used, is_new, "resource written");

        Ok(WriteOutcome {
            filename: file_name,
            is_new,
            mode_used,
        })
    }

    /// Validate, then write. Never fails, every problem is reported in the response.
    pub fn save(&self, resource: &str, text: &str, mode: WriteMode) -> SaveResponse {
        let result = validate(text)
            .map_err(StoreError::from)
            .and_then(|()| self.write(resource, text, mode));

        match result {
            Ok(outcome) => SaveResponse {
                success: true,
                message: None,
                outcome: Some(outcome),
            },
            Err(error) => {
                tracing::warn!(resource, %error, "write failed");
                SaveResponse {
                    success: false,
                    message: Some(error.to_string()),
                    outcome: None,
                }
            }
        }
    }

    /// (Re)write the example resource that shows every feature of the format
    pub fn seed_example(&self) -> Result<WriteOutcome, StoreError> {
        self.write(EXAMPLE, EXAMPLE_CONTENT, WriteMode::Overwrite)
    }

    fn replace(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        self.staged(content)?.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Like [Store::replace], but fails when `path` appeared since it was checked
    fn create(&self, path: &Path, file_name: &str, content: &str) -> Result<(), StoreError> {
        match self.staged(content)?.persist_noclobber(path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::Exists(file_name.to_string()))
            }
            Err(e) => Err(e.error.into()),
        }
    }

    fn staged(&self, content: &str) -> Result<tempfile::NamedTempFile, StoreError> {
        let mut file = tempfile::NamedTempFile::new_in(&self.root)?;
        file.write_all(content.as_bytes())?;
        Ok(file)
    }
}

/// Keep word characters, `-`, `.` and space
fn sanitize(resource: &str) -> String {
    resource
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '))
        .collect()
}

fn normalize(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Invalid filename '{0}'")]
    InvalidFilename(String),
    #[error("Path traversal detected for '{0}'")]
    PathTraversal(String),
    #[error("File '{0}' exists. Change filename or use overwrite/append.")]
    Exists(String),
    #[error("File '{0}' not found")]
    NotFound(String),
    #[error("Validation failed:\n{0}")]
    Invalid(#[from] ValidationErrors),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

const EXAMPLE_CONTENT: &str = r#"# Example resource, rewritten on every seed
[Resolution]; [Width=int]; [Height=int]; [Ratio=float]
FullHD; 1920; 1080; 1.7778
4K; 3840; 2160; 1.7778
Square1080; 1080; 1080; 1.0

[Format]
PNG
JPG

[Boolean=bool]
true
false

[Prefered Samplers]; [sampler]; [scheduler]
EulerSimple; euler; simple
EulerBeta; euler; beta
dpmpp_2m; dpmpp_2m; karras
lcm; lcm; normal

# a multiline text input named 'Prompt'
[Prompt=Textbox]
# two string inputs and one int input that are not outputs themselves
[firstname=string;output=false]
[lastname=string;output=false]
[number=int;output=false;default=1]

# output 'fullname', for example 'John Doe_nr3'
[concat=fullname];[firstname];" ";[lastname];"_nr";[number]

# USAGE:
# - the first column of a section is its dropdown
# - use ; to separate columns, [Section] starts a new section
# - visible columns and concatenations become outputs
# - types: =string (default), =int, =float, =bool, =textbox
# - attributes: output=false hides a column, default=<value> sets its default
# - a section without rows is an input field
# - comments start with #
"#;

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitize_filenames() {
        assert_eq!(sanitize(" my list "), "my list");
        assert_eq!(sanitize("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize("a/b\\c:d*e"), "abcde");
        assert_eq!(sanitize("über-1_x.txt"), "über-1_x.txt");
    }

    #[test]
    fn locate_appends_extension() {
        let store = Store::new("/nonexistent/root");
        let (file_name, path) = store.locate("colors").unwrap();
        assert_eq!(file_name, "colors.txt");
        assert_eq!(path, Path::new("/nonexistent/root/colors.txt"));

        let (file_name, _) = store.locate("Colors.TXT").unwrap();
        assert_eq!(file_name, "Colors.TXT");
    }

    #[test]
    fn locate_rejects_empty_and_dots() {
        let store = Store::new("/nonexistent/root");
        assert!(matches!(
            store.locate("///"),
            Err(StoreError::InvalidFilename(_))
        ));
        // `..` survives sanitizing but gains an extension, `...txt` is a plain file name
        assert_eq!(store.locate("..").unwrap().0, "...txt");
    }

    #[test]
    fn normalize_content() {
        assert_eq!(normalize("  a \n\n\t b\n   \n"), "a\nb");
    }

    #[test]
    fn populate_does_not_clobber_a_late_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let path = store.root().join("late.txt");
        std::fs::write(&path, "first").unwrap();

        let error = store.create(&path, "late.txt", "second").unwrap_err();
        assert!(matches!(error, StoreError::Exists(name) if name == "late.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        store.replace(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn io_errors_keep_their_cause() {
        let error = StoreError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "access denied",
        ));
        assert_eq!(error.to_string(), "IO error: access denied");
    }

    #[test]
    fn example_is_valid() {
        assert_eq!(validate(EXAMPLE_CONTENT), Ok(()));
    }
}
