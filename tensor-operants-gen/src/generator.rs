// This module drives one generation run. Every eligible entry is validated and derived before
// any text is produced, so an invalid entry aborts the run with nothing emitted. Cross-artifact
// validation then checks that eligible operation names are unique, that no two entries
// produce the same method name in one artifact, and that no generated method shadows one written
// by hand on the type the artifact extends. Emission runs the six emitters over the
// derived signatures in declaration order and collects the results into an in-memory Artifacts set,
// which can be published to a directory (staged write plus rename, unchanged files skipped) or
// compared against a directory to report stale files.

//! Generation driver and artifact publishing.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::{HashMap, HashSet};

use crate::emit::{all_emitters, Artifact, Emitter, GenConfig};
use crate::error::{GenError, GenResult};
use crate::signature::DerivedSignature;
use crate::spec::{load_declarations, AllowList, DeclaredOp, SpecEntry};

const STAGING_SUFFIX: &str = ".tmp";

/// Runs the six emitters over a list of spec entries.
pub struct Generator {
    config: GenConfig,
    emitters: Vec<Box<dyn Emitter>>,
}

impl Generator {
    pub fn new(config: GenConfig) -> Self {
        let emitters = all_emitters(&config);
        Self { config, emitters }
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// Derive every eligible entry, validate the whole set, then emit.
    pub fn generate(&self, entries: &[SpecEntry]) -> GenResult<Artifacts> {
        let signatures = self.derive_all(entries)?;
        self.check_methods(&signatures)?;

        let mut files = BTreeMap::new();
        for emitter in &self.emitters {
            let mut out = String::new();
            emitter.prologue(&mut out);
            for sig in &signatures {
                emitter.emit(sig, &mut out);
            }
            emitter.epilogue(&mut out);
            log::trace!("{} rendered, {} bytes", emitter.artifact(), out.len());
            files.insert(emitter.artifact(), out);
        }
        log::debug!(
            "generated {} artifacts for {} operations",
            files.len(),
            signatures.len()
        );
        Ok(Artifacts { files })
    }

    fn derive_all(&self, entries: &[SpecEntry]) -> GenResult<Vec<DerivedSignature>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut signatures = Vec::new();
        for entry in entries {
            if !entry.is_eligible {
                log::trace!("skipping `{}`: not allow-listed", entry.name);
                continue;
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(GenError::DuplicateOperation(entry.name.clone()));
            }
            signatures.push(DerivedSignature::derive(entry)?);
            log::debug!("derived `{}`", entry.name);
        }
        Ok(signatures)
    }

    fn check_methods(&self, signatures: &[DerivedSignature]) -> GenResult<()> {
        for emitter in &self.emitters {
            let reserved = emitter.reserved_methods();
            let mut owners: HashMap<String, &str> = HashMap::new();
            for sig in signatures {
                for method in emitter.methods(sig) {
                    if reserved.contains(&method.as_str()) {
                        return Err(GenError::validation(
                            &sig.function_name,
                            format!(
                                "generated method `{method}` of {} collides with a hand-written method",
                                emitter.artifact()
                            ),
                        ));
                    }
                    if let Some(first) = owners.insert(method.clone(), &sig.function_name) {
                        return Err(GenError::DuplicateMethod {
                            artifact: emitter.artifact().file_name(),
                            method,
                            first: first.to_string(),
                            second: sig.function_name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GenConfig::default())
    }
}

/// The six generated files, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    files: BTreeMap<Artifact, String>,
}

impl Artifacts {
    pub fn get(&self, artifact: Artifact) -> &str {
        self.files.get(&artifact).map(String::as_str).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Artifact, &str)> {
        self.files.iter().map(|(artifact, text)| (*artifact, text.as_str()))
    }

    /// Write every artifact into `dir`, leaving unchanged files untouched.
    ///
    /// Returns the artifacts actually rewritten.
    /// Every changed file is staged before any is renamed into place, so a
    /// failed write leaves the previous set untouched. Staged files are removed
    /// on error.
    pub fn publish(&self, dir: &Path) -> GenResult<Vec<Artifact>> {
        fs::create_dir_all(dir).map_err(|e| GenError::io(dir, e))?;
        let changed = self.stale(dir)?;
        if changed.is_empty() {
            log::info!("{} is up to date", dir.display());
            return Ok(changed);
        }

        let mut staged = Vec::with_capacity(changed.len());
        for &artifact in &changed {
            let staging = dir.join(format!("{}{STAGING_SUFFIX}", artifact.file_name()));
            if let Err(e) = fs::write(&staging, self.get(artifact)) {
                discard(&staged);
                return Err(GenError::io(&staging, e));
            }
            staged.push(staging);
        }

        for (i, &artifact) in changed.iter().enumerate() {
            let target = dir.join(artifact.file_name());
            if let Err(e) = fs::rename(&staged[i], &target) {
                discard(&staged[i..]);
                return Err(GenError::io(&target, e));
            }
            log::info!("wrote {}", target.display());
        }
        Ok(changed)
    }

    /// Artifacts whose file in `dir` is missing or differs.
    pub fn stale(&self, dir: &Path) -> GenResult<Vec<Artifact>> {
        let mut stale = Vec::new();
        for (artifact, text) in self.iter() {
            let path = dir.join(artifact.file_name());
            match fs::read_to_string(&path) {
                Ok(current) if current == text => {}
                Ok(_) => stale.push(artifact),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => stale.push(artifact),
                Err(e) => return Err(GenError::io(path, e)),
            }
        }
        Ok(stale)
    }

    /// Fail with [`GenError::Stale`] unless `dir` holds exactly these artifacts.
    pub fn check(&self, dir: &Path) -> GenResult<()> {
        let stale = self.stale(dir)?;
        if stale.is_empty() {
            Ok(())
        } else {
            Err(GenError::Stale(
                stale.iter().map(|a| a.file_name().to_string()).collect(),
            ))
        }
    }
}

fn discard(staged: &[PathBuf]) {
    for path in staged {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("could not remove {}: {e}", path.display());
        }
    }
}

/// Load spec files in order, apply the allow-list and generate.
///
/// Without an allow-list every entry is eligible, so every entry must parse.
pub fn generate_from_files<P: AsRef<Path>>(
    spec_paths: &[P],
    allow_list_path: Option<&Path>,
    config: GenConfig,
) -> GenResult<Artifacts> {
    let declared = load_declarations(spec_paths)?;
    let entries = match allow_list_path {
        Some(path) => AllowList::load(path)?.select(&declared)?,
        None => declared
            .iter()
            .map(|op| DeclaredOp::parse(op).map(SpecEntry::eligible))
            .collect::<GenResult<Vec<_>>>()?,
    };
    Generator::new(config).generate(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, args: &str) -> SpecEntry {
        SpecEntry::from_args(name, args).unwrap().eligible()
    }

    #[test]
    fn ineligible_entries_are_skipped() {
        let entries = vec![
            entry("abs", "(Tensor x)"),
            SpecEntry::from_args("concat", "(Tensor[] x, Scalar axis=0)").unwrap(),
        ];
        let artifacts = Generator::default().generate(&entries).unwrap();
        assert!(artifacts.get(Artifact::Interface).contains("fn abs("));
        assert!(!artifacts.get(Artifact::Interface).contains("concat"));
    }

    #[test]
    fn invalid_entry_fails_the_whole_run() {
        let entries = vec![entry("abs", "(Tensor x)"), entry("stack", "(Tensor[] x)")];
        let err = Generator::default().generate(&entries).unwrap_err();
        assert!(matches!(err, GenError::Validation { ref op, .. } if op == "stack"));
    }

    #[test]
    fn duplicate_operations_are_rejected() {
        let entries = vec![entry("abs", "(Tensor x)"), entry("abs", "(Tensor y)")];
        let err = Generator::default().generate(&entries).unwrap_err();
        assert!(matches!(err, GenError::DuplicateOperation(ref op) if op == "abs"));
    }

    #[test]
    fn colliding_method_names_are_rejected() {
        let entries = vec![
            entry("add", "(Tensor x, Tensor y)"),
            entry("add_scalar", "(Tensor x, Scalar y)"),
        ];
        let err = Generator::default().generate(&entries).unwrap_err();
        match err {
            GenError::DuplicateMethod { method, first, second, .. } => {
                assert_eq!(method, "add_scalar");
                assert_eq!(first, "add");
                assert_eq!(second, "add_scalar");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn alias_collision_is_rejected() {
        let entries = vec![
            entry("elementwise_pow", "(Tensor x, Tensor y)"),
            entry("pow", "(Tensor x, Scalar y)"),
        ];
        let err = Generator::default().generate(&entries).unwrap_err();
        assert!(matches!(err, GenError::DuplicateMethod { ref method, .. } if method == "pow"));
    }

    #[test]
    fn hand_written_methods_are_reserved() {
        let err = Generator::default()
            .generate(&[entry("mode", "(Tensor x, int axis=-1, bool keepdim=false)")])
            .unwrap_err();
        match err {
            GenError::Validation { op, reason } => {
                assert_eq!(op, "mode");
                assert!(reason.contains("operants_manager_impl.rs"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = Generator::default()
            .generate(&[entry("numel", "(Tensor x)")])
            .unwrap_err();
        assert!(matches!(err, GenError::Validation { ref reason, .. } if reason.contains("tensor_api.rs")));

        Generator::default()
            .generate(&[entry("numel_of", "(Tensor x)")])
            .unwrap();
    }

    #[test]
    fn empty_input_still_produces_scaffolds() {
        let artifacts = Generator::default().generate(&[]).unwrap();
        assert_eq!(artifacts.iter().count(), 6);
        assert!(artifacts
            .get(Artifact::ManagerDeclaration)
            .contains("pub const SIGNATURES: &'static [OpSignature] = &[\n    ];"));
    }
}
