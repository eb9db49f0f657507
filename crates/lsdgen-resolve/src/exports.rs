//! Canonical export index of a package
//!
//! Starting from the types entry file, every named export is followed to the
//! file that declares it, and wildcard re-exports pull in further files until
//! the whole re-export graph has been visited.

use ahash::AHashSet;
use indexmap::IndexMap;
use lsdgen_manifest::{ClassIndex, ClassReference, GeneratorError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Export table of a single file, as produced by the analysis front end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileExports {
    /// Classes declared and exported in this file
    pub exported_classes: Vec<String>,
    /// Interfaces declared and exported in this file
    pub exported_interfaces: Vec<String>,
    /// `export { local as exported } from './file'`, keyed by exported name
    pub exported_imported_elements: IndexMap<String, ImportedElement>,
    /// `export * from './file'`
    pub exported_imported_all: Vec<ImportedFile>,
    /// Exported name mapped to a local name whose kind is not known yet
    pub exported_unknowns: IndexMap<String, String>,
    pub declared_classes: Vec<String>,
    pub declared_interfaces: Vec<String>,
    /// Local name mapped to what the import refers to
    pub imported_elements: IndexMap<String, ClassReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedElement {
    pub local_name: String,
    pub file_name: PathBuf,
    /// Owning package when it differs from the exporting package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedFile {
    pub file_name: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
}

/// Provides the export table of source files
pub trait ExportSource {
    /// Export table of `file` (extension-less absolute path) in `package_name`
    fn file_exports(&self, package_name: &str, file: &Path) -> Result<&FileExports, GeneratorError>;
}

/// Named and wildcard exports of one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileExportDefinitions {
    pub named: ClassIndex<ClassReference>,
    /// Files whose exports are re-exported wholesale: (package name, file)
    pub unnamed: Vec<(String, PathBuf)>,
}

pub struct ExportResolver<'a> {
    source: &'a dyn ExportSource,
}

impl<'a> ExportResolver<'a> {
    pub fn new(source: &'a dyn ExportSource) -> Self {
        ExportResolver { source }
    }

    /// All named exports reachable from the types entry of a package
    ///
    /// Later files overwrite entries of earlier files with the same exported
    /// name. Every file is expanded at most once, so wildcard cycles terminate.
    pub fn package_exports(
        &self,
        package_name: &str,
        types_path: &Path,
    ) -> Result<ClassIndex<ClassReference>, GeneratorError> {
        let mut exports = ClassIndex::new();
        let mut visited: AHashSet<(String, PathBuf)> = AHashSet::new();
        let mut queue = VecDeque::from([(package_name.to_string(), types_path.to_path_buf())]);

        while let Some((package, file)) = queue.pop_front() {
            if !visited.insert((package.clone(), file.clone())) {
                debug!("Skipping already visited export file {:?}", file);
                continue;
            }
            let FileExportDefinitions { named, unnamed } = self.file_exports(&package, &file)?;
            exports.extend(named);
            queue.extend(unnamed);
        }

        debug!(
            "Resolved {} exports of {} from {:?}",
            exports.len(),
            package_name,
            types_path
        );
        Ok(exports)
    }

    /// Named and wildcard exports of a single file
    pub fn file_exports(
        &self,
        package_name: &str,
        file: &Path,
    ) -> Result<FileExportDefinitions, GeneratorError> {
        let table = self.source.file_exports(package_name, file)?;
        let mut definitions = FileExportDefinitions::default();
        let local = |name: &str| ClassReference::new(package_name, name, file);

        for name in table.exported_classes.iter().chain(&table.exported_interfaces) {
            definitions.named.insert(name.clone(), local(name));
        }

        for (exported_name, element) in &table.exported_imported_elements {
            let owner = element.package_name.as_deref().unwrap_or(package_name);
            let reference = ClassReference::new(owner, &element.local_name, element.file_name.clone())
                .referenced_from(file);
            definitions
                .named
                .insert(exported_name.clone(), self.follow_reexports(reference));
        }

        // Declared classes, then declared interfaces, then imports
        for (exported_name, local_name) in &table.exported_unknowns {
            if table.declared_classes.contains(local_name)
                || table.declared_interfaces.contains(local_name)
            {
                definitions
                    .named
                    .insert(exported_name.clone(), local(local_name));
                continue;
            }
            if let Some(imported) = table.imported_elements.get(local_name) {
                definitions
                    .named
                    .insert(exported_name.clone(), self.follow_reexports(imported.clone()));
            }
        }

        definitions.unnamed = table
            .exported_imported_all
            .iter()
            .map(|target| {
                (
                    target
                        .package_name
                        .clone()
                        .unwrap_or_else(|| package_name.to_string()),
                    target.file_name.clone(),
                )
            })
            .collect();

        Ok(definitions)
    }

    /// Follow named re-exports until the file that declares the referenced type
    ///
    /// Stops at a file that declares the name, at a file without an export
    /// table, and at a file already seen. The file through which the export
    /// was first reached is kept.
    fn follow_reexports(&self, start: ClassReference) -> ClassReference {
        let mut current = start;
        let mut visited: AHashSet<(PathBuf, String)> = AHashSet::new();

        while visited.insert((current.file_name.clone(), current.local_name.to_string())) {
            let Ok(table) = self.source.file_exports(&current.package_name, &current.file_name) else {
                break;
            };
            let name = current.local_name.as_ref();
            let declared = [
                &table.exported_classes,
                &table.exported_interfaces,
                &table.declared_classes,
                &table.declared_interfaces,
            ]
            .iter()
            .any(|names| names.iter().any(|n| n == name));
            if declared {
                break;
            }

            let next = if let Some(element) = table.exported_imported_elements.get(name) {
                let owner = element
                    .package_name
                    .as_deref()
                    .unwrap_or(current.package_name.as_ref());
                ClassReference::new(owner, &element.local_name, element.file_name.clone())
            } else {
                let local_name = table.exported_unknowns.get(name).map_or(name, String::as_str);
                match table.imported_elements.get(local_name) {
                    Some(imported) => imported.clone(),
                    None => break,
                }
            };
            debug!(
                "Following re-export of {} from {:?} to {:?}",
                name, current.file_name, next.file_name
            );
            let referenced = current.file_name_referenced.clone();
            current = next.referenced_from(&referenced);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MapSource(IndexMap<PathBuf, FileExports>);

    impl MapSource {
        fn with(mut self, file: &str, exports: FileExports) -> Self {
            self.0.insert(PathBuf::from(file), exports);
            self
        }
    }

    impl ExportSource for MapSource {
        fn file_exports(&self, _package_name: &str, file: &Path) -> Result<&FileExports, GeneratorError> {
            self.0
                .get(file)
                .ok_or_else(|| GeneratorError::MissingTypeIndexEntry(file.to_path_buf()))
        }
    }

    fn wildcard(file: &str) -> ImportedFile {
        ImportedFile {
            file_name: PathBuf::from(file),
            package_name: None,
        }
    }

    #[test]
    fn test_direct_exports() {
        let source = MapSource::default().with(
            "/p/index",
            FileExports {
                exported_classes: vec!["A".to_string()],
                exported_interfaces: vec!["IA".to_string()],
                ..Default::default()
            },
        );
        let resolver = ExportResolver::new(&source);
        let Ok(exports) = resolver.package_exports("p", Path::new("/p/index")) else {
            panic!("exports should resolve");
        };
        let names: Vec<&String> = exports.keys().collect();
        assert_eq!(names, vec!["A", "IA"]);
        assert_eq!(exports["A"].file_name, PathBuf::from("/p/index"));
    }

    #[test]
    fn test_reexport_chain_points_at_declaring_file() {
        // index: export * from './a'; a: export { C as X } from './c'; c: export class C
        let source = MapSource::default()
            .with(
                "/p/index",
                FileExports {
                    exported_imported_all: vec![wildcard("/p/lib/a")],
                    ..Default::default()
                },
            )
            .with(
                "/p/lib/a",
                FileExports {
                    exported_imported_all: vec![wildcard("/p/lib/b")],
                    ..Default::default()
                },
            )
            .with(
                "/p/lib/b",
                FileExports {
                    exported_imported_elements: IndexMap::from([(
                        "X".to_string(),
                        ImportedElement {
                            local_name: "C".to_string(),
                            file_name: PathBuf::from("/p/lib/c"),
                            package_name: None,
                        },
                    )]),
                    ..Default::default()
                },
            );
        let resolver = ExportResolver::new(&source);
        let Ok(exports) = resolver.package_exports("p", Path::new("/p/index")) else {
            panic!("exports should resolve");
        };
        assert_eq!(exports.len(), 1);
        let x = &exports["X"];
        assert_eq!(x.local_name.as_ref(), "C");
        assert_eq!(x.file_name, PathBuf::from("/p/lib/c"));
        assert_eq!(x.file_name_referenced, PathBuf::from("/p/lib/b"));
    }

    #[test]
    fn test_wildcard_cycle_terminates() {
        let source = MapSource::default()
            .with(
                "/p/index",
                FileExports {
                    exported_classes: vec!["A".to_string()],
                    exported_imported_all: vec![wildcard("/p/lib/b")],
                    ..Default::default()
                },
            )
            .with(
                "/p/lib/b",
                FileExports {
                    exported_classes: vec!["B".to_string()],
                    exported_imported_all: vec![wildcard("/p/index")],
                    ..Default::default()
                },
            );
        let resolver = ExportResolver::new(&source);
        let exports = resolver.package_exports("p", Path::new("/p/index"));
        assert!(exports.is_ok_and(|e| e.len() == 2));
    }

    #[test]
    fn test_unknown_exports_resolution_order() {
        let imported = ClassReference::new("dep", "Imported", "/p/node_modules/dep/lib/Imported");
        let table = FileExports {
            exported_unknowns: IndexMap::from([
                ("FromImport".to_string(), "Imported".to_string()),
                ("Declared".to_string(), "Local".to_string()),
                ("Skipped".to_string(), "Imported".to_string()),
            ]),
            declared_classes: vec!["Local".to_string()],
            imported_elements: IndexMap::from([("Imported".to_string(), imported.clone())]),
            ..Default::default()
        };
        let source = MapSource::default().with("/p/index", table);
        let resolver = ExportResolver::new(&source);
        let Ok(definitions) = resolver.file_exports("p", Path::new("/p/index")) else {
            panic!("file exports should resolve");
        };

        assert_eq!(definitions.named.get("FromImport"), Some(&imported));
        assert_eq!(
            definitions.named.get("Declared").map(|r| r.file_name.clone()),
            Some(PathBuf::from("/p/index"))
        );
        assert_eq!(definitions.named.get("Skipped"), Some(&imported));
    }

    #[test]
    fn test_every_locally_declared_unknown_export_resolves() {
        // export { A, B } with both declared in the same file
        let table = FileExports {
            exported_unknowns: IndexMap::from([
                ("A".to_string(), "A".to_string()),
                ("B".to_string(), "B".to_string()),
            ]),
            declared_classes: vec!["A".to_string()],
            declared_interfaces: vec!["B".to_string()],
            ..Default::default()
        };
        let source = MapSource::default().with("/p/index", table);
        let resolver = ExportResolver::new(&source);
        let Ok(exports) = resolver.package_exports("p", Path::new("/p/index")) else {
            panic!("exports should resolve");
        };
        let names: Vec<&String> = exports.keys().collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    fn named(local_name: &str, file: &str) -> ImportedElement {
        ImportedElement {
            local_name: local_name.to_string(),
            file_name: PathBuf::from(file),
            package_name: None,
        }
    }

    #[test]
    fn test_named_reexport_chain_points_at_declaring_file() {
        // index: export { X } from './lib/b'; b: export { C as X } from './c'; c: export class C
        let source = MapSource::default()
            .with(
                "/p/index",
                FileExports {
                    exported_imported_elements: IndexMap::from([("X".to_string(), named("X", "/p/lib/b"))]),
                    ..Default::default()
                },
            )
            .with(
                "/p/lib/b",
                FileExports {
                    exported_imported_elements: IndexMap::from([("X".to_string(), named("C", "/p/lib/c"))]),
                    ..Default::default()
                },
            )
            .with(
                "/p/lib/c",
                FileExports {
                    exported_classes: vec!["C".to_string()],
                    ..Default::default()
                },
            );
        let resolver = ExportResolver::new(&source);
        let Ok(exports) = resolver.package_exports("p", Path::new("/p/index")) else {
            panic!("exports should resolve");
        };
        let x = &exports["X"];
        assert_eq!(x.local_name.as_ref(), "C");
        assert_eq!(x.file_name, PathBuf::from("/p/lib/c"));
        assert_eq!(x.file_name_referenced, PathBuf::from("/p/index"));
    }

    #[test]
    fn test_named_reexport_through_import_and_cycle() {
        // index: export { Foo } from './lib'; lib: import { Foo } from './Foo'; export { Foo }
        // loop: export { L } from './loop' in both directions
        let foo = ClassReference::new("p", "Foo", "/p/lib/Foo");
        let source = MapSource::default()
            .with(
                "/p/index",
                FileExports {
                    exported_imported_elements: IndexMap::from([
                        ("Foo".to_string(), named("Foo", "/p/lib/index")),
                        ("L".to_string(), named("L", "/p/loop")),
                    ]),
                    ..Default::default()
                },
            )
            .with(
                "/p/lib/index",
                FileExports {
                    exported_unknowns: IndexMap::from([("Foo".to_string(), "Foo".to_string())]),
                    imported_elements: IndexMap::from([("Foo".to_string(), foo)]),
                    ..Default::default()
                },
            )
            .with(
                "/p/lib/Foo",
                FileExports {
                    declared_classes: vec!["Foo".to_string()],
                    exported_classes: vec!["Foo".to_string()],
                    ..Default::default()
                },
            )
            .with(
                "/p/loop",
                FileExports {
                    exported_imported_elements: IndexMap::from([("L".to_string(), named("L", "/p/loop"))]),
                    ..Default::default()
                },
            );
        let resolver = ExportResolver::new(&source);
        let Ok(exports) = resolver.package_exports("p", Path::new("/p/index")) else {
            panic!("exports should resolve");
        };
        assert_eq!(exports["Foo"].file_name, PathBuf::from("/p/lib/Foo"));
        assert_eq!(exports["L"].file_name, PathBuf::from("/p/loop"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let source = MapSource::default();
        let resolver = ExportResolver::new(&source);
        assert!(matches!(
            resolver.package_exports("p", Path::new("/p/index")),
            Err(GeneratorError::MissingTypeIndexEntry(_))
        ));
    }
}
