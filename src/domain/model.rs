use crate::utils::error::{Result, ScaffoldError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Header,
    Implementation,
}

impl FileKind {
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Header => "h",
            FileKind::Implementation => "c",
        }
    }
}

/// A C file read once from disk. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    kind: FileKind,
    content: String,
}

impl SourceFile {
    /// Reads and canonicalizes `path`. Headers are decoded lossily so stray
    /// Latin-1 bytes in comments do not abort extraction; implementation
    /// text is spliced verbatim and must be valid UTF-8.
    pub fn read(path: &Path, kind: FileKind) -> Result<Self> {
        let absolute = std::fs::canonicalize(path).map_err(|source| ScaffoldError::ExtractionError {
            path: path.to_path_buf(),
            source,
        })?;
        let bytes = std::fs::read(&absolute).map_err(|source| ScaffoldError::ExtractionError {
            path: absolute.clone(),
            source,
        })?;

        let content = match (kind, String::from_utf8(bytes)) {
            (_, Ok(text)) => text,
            (FileKind::Header, Err(e)) => {
                tracing::warn!(
                    "{} is not valid UTF-8; invalid bytes replaced",
                    absolute.display()
                );
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
            (FileKind::Implementation, Err(e)) => {
                return Err(ScaffoldError::ExtractionError {
                    path: absolute,
                    source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                })
            }
        };

        Ok(Self {
            path: absolute,
            kind,
            content,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// File name without extension, e.g. `math` for `src/math.c`.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("module")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Directive,
    StructOrEnum,
    FunctionPrototype,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub text: String,
    /// Byte offset of the fragment in the text it was extracted from.
    pub order: usize,
}

impl Declaration {
    pub fn new(kind: DeclarationKind, text: impl Into<String>, order: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            order,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub directives: Vec<Declaration>,
    pub structs_and_enums: Vec<Declaration>,
    pub prototypes: Vec<Declaration>,
}

impl Extraction {
    /// All declarations merged in first-appearance order.
    pub fn declarations(&self) -> Vec<Declaration> {
        let mut all: Vec<Declaration> = self
            .directives
            .iter()
            .chain(&self.structs_and_enums)
            .chain(&self.prototypes)
            .cloned()
            .collect();
        all.sort_by_key(|d| d.order);
        all
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.structs_and_enums.is_empty() && self.prototypes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.directives.len() + self.structs_and_enums.len() + self.prototypes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTestModule {
    pub file_name: String,
    pub content: String,
    /// File name of the implementation file the module binds, e.g. `math.c`.
    pub source_name: String,
}

impl GeneratedTestModule {
    /// `test_<stem><ext>`, where `ext` includes its leading dot or is empty.
    pub fn file_name_for(stem: &str, extension: &str) -> String {
        format!("test_{}{}", stem, extension)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Turns a non-zero status into `ExternalToolError`.
    pub fn check(self, tool: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(ScaffoldError::ExternalToolError {
                tool: tool.to_string(),
                status: self.status,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub module_path: PathBuf,
    pub report_index: PathBuf,
}
