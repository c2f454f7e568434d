//! The "where am I" snapshot exposed to expressions and `${...}` substitution.

use std::collections::BTreeMap;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use anylint_expr::Value;
use serde::Serialize;

/// Inputs a [`Context`] is derived from.
#[derive(Debug, Clone, Default)]
pub struct ContextInput {
    /// Workspace folders, in priority order.
    pub workspace_folders: Vec<PathBuf>,
    /// Absolute path of the linted document.
    pub file: PathBuf,
    /// Zero-based line of the selection start.
    pub selection_line: u32,
    /// Selected text, empty when nothing is selected.
    pub selected_text: String,
    /// Language identifier of the document.
    pub language_id: String,
}

/// Read-only snapshot of the linted document's location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub workspace_folder: String,
    pub workspace_folder_basename: String,
    pub file: String,
    pub file_workspace_folder: String,
    pub relative_file: String,
    pub relative_file_dirname: String,
    pub file_basename: String,
    pub file_basename_no_extension: String,
    pub file_dirname: String,
    pub file_extname: String,
    pub cwd: String,
    /// One-based line of the selection, as text.
    pub line_number: String,
    pub selected_text: String,
    pub path_separator: String,
    pub language_id: String,
}

impl Context {
    /// Derives every field from `input`.
    ///
    /// The active workspace is the first folder the file lives under, falling
    /// back to the first folder. The relative file is only stripped when such
    /// a folder exists.
    pub fn new(input: ContextInput) -> Self {
        let file = path_string(&input.file);
        let first = input.workspace_folders.first();

        let mut active = first;
        let mut relative_file = file.clone();
        for folder in &input.workspace_folders {
            if folder.as_os_str().is_empty() {
                continue;
            }
            if let Ok(rest) = input.file.strip_prefix(folder) {
                active = Some(folder);
                relative_file = path_string(rest);
                break;
            }
        }

        let relative_file_dirname = relative_file
            .rfind(MAIN_SEPARATOR_STR)
            .map(|index| relative_file[..index].to_string())
            .unwrap_or_default();
        let file_dirname = input.file.parent().map(path_string).unwrap_or_default();
        let file_extname = input
            .file
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        Self {
            workspace_folder: first.map(|f| path_string(f)).unwrap_or_default(),
            workspace_folder_basename: first.map(|f| file_name(f)).unwrap_or_default(),
            file_workspace_folder: active.map(|f| path_string(f)).unwrap_or_default(),
            relative_file_dirname,
            relative_file,
            file_basename: file_name(&input.file),
            file_basename_no_extension: input
                .file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            cwd: file_dirname.clone(),
            file_dirname,
            file_extname,
            line_number: (u64::from(input.selection_line) + 1).to_string(),
            selected_text: input.selected_text,
            path_separator: MAIN_SEPARATOR_STR.to_string(),
            language_id: input.language_id,
            file,
        }
    }

    /// Field names and values, in substitution order.
    pub fn fields(&self) -> [(&'static str, &str); 15] {
        [
            ("workspaceFolder", &self.workspace_folder),
            ("workspaceFolderBasename", &self.workspace_folder_basename),
            ("file", &self.file),
            ("fileWorkspaceFolder", &self.file_workspace_folder),
            ("relativeFile", &self.relative_file),
            ("relativeFileDirname", &self.relative_file_dirname),
            ("fileBasename", &self.file_basename),
            ("fileBasenameNoExtension", &self.file_basename_no_extension),
            ("fileDirname", &self.file_dirname),
            ("fileExtname", &self.file_extname),
            ("cwd", &self.cwd),
            ("lineNumber", &self.line_number),
            ("selectedText", &self.selected_text),
            ("pathSeparator", &self.path_separator),
            ("languageId", &self.language_id),
        ]
    }

    /// Replaces every `${field}` with the field's value.
    ///
    /// Plain textual replacement, one field after the other. Unknown names
    /// are left untouched.
    pub fn substitute(&self, input: &str) -> String {
        let mut output = input.to_string();
        for (name, value) in self.fields() {
            let placeholder = format!("${{{}}}", name);
            if output.contains(&placeholder) {
                output = output.replace(&placeholder, value);
            }
        }
        output
    }

    /// The context as an expression object with camelCase keys.
    pub fn to_value(&self) -> Value {
        let fields: BTreeMap<String, Value> = self
            .fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), Value::from(value)))
            .collect();
        Value::from(fields)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
