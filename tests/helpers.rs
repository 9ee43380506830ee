//! Shared test utilities: a temporary project layout and fakes for the
//! environment-manager and archive-builder seams.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tempfile::TempDir;

use lambda_pack::archive::ArchiveBuilder;
use lambda_pack::pipenv::EnvironmentManager;

/// Test environment with a pipenv-style project directory and a fake
/// virtualenv tree.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Project directory (Pipfile, router.py, config.ini)
    pub project: PathBuf,
    /// Fake virtualenv root
    pub venv: PathBuf,
    /// site-packages inside the fake virtualenv
    pub site_packages: PathBuf,
}

impl TestEnv {
    /// Create a project with manifest, lock, and first-party files, plus a
    /// virtualenv containing a typical installed layout.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let project = base.join("project");
        fs::create_dir_all(&project).unwrap();
        for file in ["Pipfile", "Pipfile.lock", "router.py", "config.ini"] {
            fs::write(project.join(file), format!("# {file}\n")).unwrap();
        }

        let venv = base.join("venv");
        let site_packages = venv.join("lib/python3.12/site-packages");
        fs::create_dir_all(&site_packages).unwrap();
        for dir in [
            "requests",
            "boto3",
            "botocore",
            "boto3_type_annotations",
            "pip",
            "requests-2.31.0.dist-info",
        ] {
            fs::create_dir_all(site_packages.join(dir)).unwrap();
            fs::write(site_packages.join(dir).join("__init__.py"), "# module\n").unwrap();
        }

        Self {
            _temp_dir: temp_dir,
            project,
            venv,
            site_packages,
        }
    }

    /// Remove a first-party file to simulate an incomplete project.
    pub fn remove_project_file(&self, name: &str) {
        fs::remove_file(self.project.join(name)).unwrap();
    }

    /// Remove a site-packages entry.
    pub fn remove_site_entry(&self, name: &str) {
        fs::remove_dir_all(self.site_packages.join(name)).unwrap();
    }
}

/// Fake environment manager recording calls.
pub struct FakeEnv {
    pub venv: PathBuf,
    pub calls: RefCell<Vec<String>>,
    pub fail_install: bool,
}

impl FakeEnv {
    pub fn new(venv: &Path) -> Self {
        Self {
            venv: venv.to_path_buf(),
            calls: RefCell::new(Vec::new()),
            fail_install: false,
        }
    }

    pub fn failing_install(venv: &Path) -> Self {
        Self {
            fail_install: true,
            ..Self::new(venv)
        }
    }
}

impl EnvironmentManager for FakeEnv {
    fn remove_environment(&self, _project_dir: &Path) -> Result<()> {
        self.calls.borrow_mut().push("remove_environment".to_string());
        Ok(())
    }

    fn install_deploy(&self, _project_dir: &Path) -> Result<()> {
        self.calls.borrow_mut().push("install_deploy".to_string());
        if self.fail_install {
            bail!("Your Pipfile.lock is out of date");
        }
        Ok(())
    }

    fn environment_root(&self, _project_dir: &Path) -> Result<PathBuf> {
        self.calls.borrow_mut().push("environment_root".to_string());
        Ok(self.venv.clone())
    }
}

/// Fake archive builder recording calls. `add_tree` materializes the
/// archive file so checksum and marker handling behave as in production.
pub struct FakeArchive {
    pub calls: RefCell<Vec<String>>,
    pub listing: Vec<String>,
    pub fail_add_files: bool,
}

impl FakeArchive {
    pub fn new(listing: &[&str]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            listing: listing.iter().map(|s| s.to_string()).collect(),
            fail_add_files: false,
        }
    }

    /// A listing that satisfies the default verification invariants.
    pub fn with_clean_listing() -> Self {
        Self::new(&[
            "requests/",
            "requests/__init__.py",
            "boto3_type_annotations/",
            "boto3_type_annotations/__init__.py",
            "router.py",
            "config.ini",
        ])
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| c.split_whitespace().next().unwrap_or("").to_string())
            .collect()
    }
}

impl ArchiveBuilder for FakeArchive {
    fn add_tree(&self, archive: &Path, dir: &Path, exclude: &[String]) -> Result<()> {
        self.calls.borrow_mut().push(format!(
            "add_tree dir={} exclude={}",
            dir.display(),
            exclude.join(",")
        ));
        fs::write(archive, b"fake zip payload")?;
        Ok(())
    }

    fn add_entries(&self, archive: &Path, _dir: &Path, entries: &[String]) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("add_entries entries={}", entries.join(",")));
        if !archive.exists() {
            bail!("archive missing before add_entries");
        }
        Ok(())
    }

    fn delete(&self, archive: &Path, patterns: &[String]) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("delete patterns={}", patterns.join(",")));
        if !archive.exists() {
            bail!("archive missing before delete");
        }
        Ok(())
    }

    fn add_files(&self, archive: &Path, dir: &Path, files: &[String]) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("add_files files={}", files.join(",")));
        if self.fail_add_files {
            bail!("zip failed while adding first-party files");
        }
        for file in files {
            if !dir.join(file).is_file() {
                bail!("First-party file '{}' not found", file);
            }
        }
        if !archive.exists() {
            bail!("archive missing before add_files");
        }
        Ok(())
    }

    fn list(&self, _archive: &Path) -> Result<Vec<String>> {
        self.calls.borrow_mut().push("list".to_string());
        Ok(self.listing.clone())
    }
}
