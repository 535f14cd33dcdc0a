use crate::git_tool::{CloneOutcome, GitTool, ToolError};
use git2::{BranchType, Commit, Oid, Repository, Signature};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

pub(crate) fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

pub(crate) fn init_bare(path: &Path) -> Repository {
    Repository::init_bare(path).unwrap()
}

/// Non-bare repository with two branches, a lightweight tag and an annotated
/// tag. Returns the repository and the commit HEAD points at.
pub(crate) fn tagged_source_repo(path: &Path) -> (Repository, Oid) {
    let repo = Repository::init(path).unwrap();
    let base = commit_file(&repo, "base.txt", "base", &[], Some("HEAD"));
    let base_commit = repo.find_commit(base).unwrap();
    let feature = commit_file(
        &repo,
        "feature.txt",
        "feature",
        &[&base_commit],
        Some("refs/heads/feature"),
    );
    let head = commit_file(&repo, "main.txt", "main", &[&base_commit], Some("HEAD"));

    let sig = signature();
    repo.tag_lightweight("v0.1.0", &repo.find_object(base, None).unwrap(), false)
        .unwrap();
    repo.tag(
        "v0.2.0-feature",
        &repo.find_object(feature, None).unwrap(),
        &sig,
        "feature release",
        false,
    )
    .unwrap();
    drop(base_commit);
    (repo, head)
}

pub(crate) fn commit_file(
    repo: &Repository,
    name: &str,
    contents: &str,
    parents: &[&Commit<'_>],
    update_ref: Option<&str>,
) -> Oid {
    let workdir = repo.workdir().unwrap();
    std::fs::write(workdir.join(name), contents).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = signature();
    repo.commit(update_ref, &sig, &sig, "commit", &tree, parents)
        .unwrap()
}

fn signature() -> Signature<'static> {
    Signature::now("tester", "tester@example.com").unwrap()
}

pub(crate) fn branch_names(repo: &Repository) -> BTreeSet<String> {
    repo.branches(Some(BranchType::Local))
        .unwrap()
        .map(|branch| {
            let (branch, _) = branch.unwrap();
            branch.name().unwrap().unwrap_or_default().to_string()
        })
        .collect()
}

pub(crate) fn tag_names(repo: &Repository) -> BTreeSet<String> {
    repo.tag_names(None)
        .unwrap()
        .iter()
        .flatten()
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Call {
    Clone { source: String, path: PathBuf },
    Fetch { path: PathBuf },
    PushBranches { path: PathBuf, destination: String },
    PushTags { path: PathBuf, destination: String },
}

/// Records every call. Paths listed in `cloned` count as existing mirrors.
/// A URL in `failing` (source or destination, or the working copy path for
/// fetch) makes that step exit 1, a URL
/// in `flaky` does so for its first few calls, and a URL in `panicking`
/// makes the step panic. A URL in `failing_tags` fails only its tag push.
#[derive(Default)]
pub(crate) struct FakeTool {
    calls: Mutex<Vec<Call>>,
    cloned: Mutex<HashSet<PathBuf>>,
    failing: HashSet<String>,
    failing_tags: HashSet<String>,
    flaky: Mutex<HashMap<String, usize>>,
    panicking: HashSet<String>,
}

impl FakeTool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub(crate) fn failing_tags_on(mut self, url: &str) -> Self {
        self.failing_tags.insert(url.to_string());
        self
    }

    pub(crate) fn failing_times(self, url: &str, times: usize) -> Self {
        self.flaky.lock().unwrap().insert(url.to_string(), times);
        self
    }

    pub(crate) fn panicking_on(mut self, url: &str) -> Self {
        self.panicking.insert(url.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn clone_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Clone { .. }))
            .count()
    }

    fn check(&self, url: &str, command: &str) -> Result<(), ToolError> {
        if self.panicking.contains(url) {
            panic!("fake tool exploded on {url}");
        }
        let flaky = match self.flaky.lock().unwrap().get_mut(url) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        if flaky || self.failing.contains(url) {
            return Err(ToolError::Exit {
                command: format!("git {command} {url}"),
                code: Some(1),
                stderr: format!("fatal: unable to access '{url}'"),
            });
        }
        Ok(())
    }
}

impl GitTool for FakeTool {
    fn ensure_mirror_clone(
        &self,
        source_url: &str,
        local_path: &Path,
    ) -> Result<CloneOutcome, ToolError> {
        if self.cloned.lock().unwrap().contains(local_path) {
            return Ok(CloneOutcome::Existing);
        }
        self.calls.lock().unwrap().push(Call::Clone {
            source: source_url.to_string(),
            path: local_path.to_path_buf(),
        });
        self.check(source_url, "clone --mirror")?;
        self.cloned.lock().unwrap().insert(local_path.to_path_buf());
        Ok(CloneOutcome::Cloned)
    }

    fn fetch(&self, local_path: &Path) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push(Call::Fetch {
            path: local_path.to_path_buf(),
        });
        self.check(&local_path.to_string_lossy(), "fetch --prune")
    }

    fn push_all_branches(
        &self,
        local_path: &Path,
        destination_url: &str,
    ) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push(Call::PushBranches {
            path: local_path.to_path_buf(),
            destination: destination_url.to_string(),
        });
        self.check(destination_url, "push --all")
    }

    fn push_all_tags(&self, local_path: &Path, destination_url: &str) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push(Call::PushTags {
            path: local_path.to_path_buf(),
            destination: destination_url.to_string(),
        });
        if self.failing_tags.contains(destination_url) {
            return Err(ToolError::Exit {
                command: format!("git push --tags {destination_url}"),
                code: Some(1),
                stderr: "! [remote rejected] (hook declined)".to_string(),
            });
        }
        self.check(destination_url, "push --tags")
    }
}
