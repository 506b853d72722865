//! Checks that the unit test tree mirrors `src/` and that every test file is compiled

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::io;
    use std::path::Path;

    const SRC_DIR: &str = "src";
    const UNIT_DIR: &str = "tests/unit";
    const TESTS_DIR: &str = "tests";

    /// Relative `.rs` files and directories below `dir`
    fn relative_paths(dir: &Path, base: &Path) -> io::Result<BTreeSet<String>> {
        let mut paths = BTreeSet::new();
        if !dir.is_dir() {
            return Ok(paths);
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let relative = path
                .strip_prefix(base)
                .map_err(|_| io::Error::other("entry outside base directory"))?
                .to_string_lossy()
                .to_string();

            if path.is_dir() {
                paths.extend(relative_paths(&path, base)?);
                paths.insert(relative);
            } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
                paths.insert(relative);
            }
        }

        Ok(paths)
    }

    fn src_and_unit_paths() -> (BTreeSet<String>, BTreeSet<String>) {
        let src = relative_paths(Path::new(SRC_DIR), Path::new(SRC_DIR))
            .unwrap_or_else(|error| panic!("Failed to read {SRC_DIR}: {error}"));
        let unit = relative_paths(Path::new(UNIT_DIR), Path::new(UNIT_DIR)).unwrap_or_default();
        (src, unit)
    }

    // Entry points and module files carry no logic of their own
    fn needs_unit_test(src_path: &str) -> bool {
        src_path != "main.rs" && src_path != "lib.rs" && !src_path.ends_with("mod.rs")
    }

    #[test]
    fn test_all_src_files_have_unit_tests() {
        let (src, unit) = src_and_unit_paths();

        let missing: Vec<String> = src
            .iter()
            .filter(|path| needs_unit_test(path) && !unit.contains(*path))
            .map(|path| format!("  - src/{path} -> {UNIT_DIR}/{path}"))
            .collect();

        assert!(
            missing.is_empty(),
            "Source files without unit test counterparts:\n{}",
            missing.join("\n")
        );
    }

    #[test]
    fn test_all_unit_tests_have_src_counterparts() {
        let (src, unit) = src_and_unit_paths();

        let orphaned: Vec<String> = unit
            .iter()
            .filter(|path| !path.ends_with("mod.rs") && !src.contains(*path))
            .map(|path| format!("  - {UNIT_DIR}/{path} -> src/{path} (missing)"))
            .collect();

        assert!(
            orphaned.is_empty(),
            "Unit test files without source counterparts:\n{}",
            orphaned.join("\n")
        );
    }

    #[test]
    fn test_unit_files_are_declared() {
        let (_, unit) = src_and_unit_paths();
        let mut undeclared = Vec::new();

        for path in unit.iter().filter(|path| {
            Path::new(path.as_str()).extension().and_then(|ext| ext.to_str()) == Some("rs")
                && !path.ends_with("mod.rs")
        }) {
            let file = Path::new(UNIT_DIR).join(path);
            let (Some(parent), Some(stem)) = (file.parent(), file.file_stem()) else {
                continue;
            };
            let declaration = format!("mod {};", stem.to_string_lossy());
            let module_file = fs::read_to_string(parent.join("mod.rs")).unwrap_or_default();
            if !module_file.lines().any(|line| line.trim() == declaration) {
                undeclared.push(format!("  - {}", file.display()));
            }
        }

        assert!(
            undeclared.is_empty(),
            "Unit test files not declared in their mod.rs:\n{}",
            undeclared.join("\n")
        );
    }

    fn scan_for_tests(dir: &Path, without_tests: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                scan_for_tests(&path, without_tests)?;
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
                continue;
            }

            // Test crate roots only declare the module tree beside them
            let is_crate_root =
                path.parent() == Some(Path::new(TESTS_DIR)) && path.with_extension("").is_dir();
            if is_crate_root || path.file_name().and_then(|n| n.to_str()) == Some("mod.rs") {
                continue;
            }

            if !fs::read_to_string(&path)?.contains("#[test]") {
                without_tests.push(format!("  - {}", path.display()));
            }
        }

        Ok(())
    }

    #[test]
    fn test_all_test_files_contain_tests() {
        let mut without_tests = Vec::new();
        scan_for_tests(Path::new(TESTS_DIR), &mut without_tests)
            .unwrap_or_else(|error| panic!("Failed to scan {TESTS_DIR}: {error}"));

        assert!(
            without_tests.is_empty(),
            "Test files without any #[test] function:\n{}",
            without_tests.join("\n")
        );
    }
}
