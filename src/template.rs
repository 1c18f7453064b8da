//! Template descriptor: a template's text plus its optional metadata sidecar.

use crate::{
    render::parser::{Field, extract_fields},
    util,
};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

const EXTENSION: &str = "tpl";

/// Contents of `<name>.toml` next to `<name>.tpl`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Meta {
    pub description: Option<String>,
    /// Policy documents the generated text has to comply with.
    pub policies: Vec<String>,
}

/// A loaded template ready for field extraction and filling.
#[derive(Clone, Debug)]
pub struct Template {
    pub name: String,
    pub path: Option<PathBuf>,
    pub content: String,
    pub meta: Meta,
}

impl Template {
    /// Load `<library>/<name>.tpl`.
    pub fn load(library: &Path, name: &str) -> Result<Self> {
        let path = library.join(format!("{name}.{EXTENSION}"));
        if !path.is_file() {
            bail!("template not found: {}", path.display());
        }
        let mut tpl = Self::from_path(&path)?;
        tpl.name = name.to_owned();
        Ok(tpl)
    }

    /// Load an arbitrary template file; its name is the file stem.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read template {}", path.display()))?;

        // A `.toml` template has no sidecar; it would be its own metadata.
        let meta_path = path.with_extension("toml");
        let sidecar = if meta_path == path {
            None
        } else {
            util::read_optional(&meta_path)?
        };
        let meta = match sidecar {
            Some(src) => toml::from_str(&src)
                .with_context(|| format!("parse {}", meta_path.display()))?,
            None => Meta::default(),
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            content,
            meta,
        })
    }

    /// A template that lives only in memory (e.g. read from stdin).
    pub fn from_text(name: &str, content: String) -> Self {
        Self {
            name: name.to_owned(),
            path: None,
            content,
            meta: Meta::default(),
        }
    }

    /// Resolve a command-line template argument.
    ///
    /// `-` reads stdin, an existing file is loaded directly, anything else
    /// is looked up by name in `library`.
    pub fn resolve(library: &Path, arg: &str) -> Result<Self> {
        if arg == "-" {
            return Ok(Self::from_text("stdin", util::read_stdin()?));
        }
        let as_path = Path::new(arg);
        if as_path.is_file() {
            return Self::from_path(as_path);
        }
        Self::load(library, arg).with_context(|| format!("resolve template '{arg}'"))
    }

    pub fn fields(&self) -> Vec<Field> {
        extract_fields(&self.content)
    }
}

/// Names of all templates under `library`, sorted.
///
/// A name is the path relative to `library` without the `.tpl` extension.
pub fn list(library: &Path) -> Result<Vec<String>> {
    if !library.is_dir() {
        bail!("templates directory not found: {}", library.display());
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(library).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|x| x.to_str()) != Some(EXTENSION)
        {
            continue;
        }
        let rel = path.strip_prefix(library)?.with_extension("");
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        names.push(name);
    }

    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Dear #############\ntitle: Name\ndescription: Recipient\n#############,\n";

    #[test]
    fn load_reads_text_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("letter.tpl"), SAMPLE).unwrap();
        fs::write(
            dir.path().join("letter.toml"),
            "description = \"Cover letter\"\npolicies = [\"tone\", \"privacy\"]\n",
        )
        .unwrap();

        let tpl = Template::load(dir.path(), "letter").unwrap();
        assert_eq!(tpl.name, "letter");
        assert_eq!(tpl.meta.description.as_deref(), Some("Cover letter"));
        assert_eq!(tpl.meta.policies, ["tone", "privacy"]);
        assert_eq!(tpl.fields().len(), 1);
        assert_eq!(tpl.fields()[0].title, "Name");
    }

    #[test]
    fn sidecar_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.tpl");
        fs::write(&path, "no fields").unwrap();

        let tpl = Template::from_path(&path).unwrap();
        assert_eq!(tpl.name, "memo");
        assert!(tpl.meta.description.is_none());
        assert!(tpl.meta.policies.is_empty());
        assert!(tpl.fields().is_empty());
    }

    #[test]
    fn toml_template_is_not_its_own_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.toml");
        fs::write(&path, "Hi #############\ntitle: Name\ndescription: who\n#############\n")
            .unwrap();

        let tpl = Template::from_path(&path).unwrap();
        assert_eq!(tpl.name, "prompt");
        assert!(tpl.meta.description.is_none());
        assert_eq!(tpl.fields().len(), 1);
        assert_eq!(tpl.fields()[0].description, "who");
    }

    #[test]
    fn bad_sidecar_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.tpl"), SAMPLE).unwrap();
        fs::write(dir.path().join("x.toml"), "colour = \"red\"\n").unwrap();
        assert!(Template::load(dir.path(), "x").is_err());
    }

    #[test]
    fn missing_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Template::load(dir.path(), "ghost").unwrap_err();
        assert!(err.to_string().contains("template not found"));
    }

    #[test]
    fn resolve_prefers_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("direct.tpl");
        fs::write(&file, SAMPLE).unwrap();

        let tpl = Template::resolve(Path::new("/nonexistent"), file.to_str().unwrap()).unwrap();
        assert_eq!(tpl.name, "direct");

        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/named.tpl"), SAMPLE).unwrap();
        let tpl = Template::resolve(&dir.path().join("lib"), "named").unwrap();
        assert_eq!(tpl.path, Some(dir.path().join("lib/named.tpl")));
    }

    #[test]
    fn list_walks_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("hr/onboarding")).unwrap();
        fs::write(dir.path().join("b.tpl"), "").unwrap();
        fs::write(dir.path().join("a.tpl"), "").unwrap();
        fs::write(dir.path().join("a.toml"), "").unwrap();
        fs::write(dir.path().join("hr/onboarding/welcome.tpl"), "").unwrap();

        assert_eq!(
            list(dir.path()).unwrap(),
            ["a", "b", "hr/onboarding/welcome"]
        );
    }

    #[test]
    fn list_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list(&dir.path().join("missing")).is_err());
    }
}
