//! Spawning the node launch script as the leader of its own process group.

use std::{
    fmt::{Debug, Formatter},
    io::BufReader,
    os::unix::process::CommandExt,
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
    time::Duration,
};

use log::{info, warn};
use nix::unistd::{Pid, getpgid};

use crate::{
    error::{HarnessError, HarnessResult},
    node::teardown::{self, TeardownReport},
};

/// Lifecycle of a spawned node, in the order it moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Starting,
    Ready,
    Terminating,
    Terminated,
}

/// A node launched from a script, leading its own process group.
///
/// The process group is torn down when the value is dropped unless [`NodeProcess::teardown`]
/// already did so, which keeps a fixture that fails half-way from leaking processes.
pub struct NodeProcess {
    pub(crate) child: Child,
    pub(crate) pgid: Pid,
    pub(crate) state: NodeState,
    pub(crate) grace_period: Duration,
    script: PathBuf,
    stdout: Option<BufReader<ChildStdout>>,
}

impl Debug for NodeProcess {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeProcess")
            .field("script", &self.script)
            .field("pid", &self.pid())
            .field("pgid", &self.pgid())
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for NodeProcess {
    fn drop(&mut self) {
        if self.state != NodeState::Terminated {
            if let Err(e) = teardown::teardown(self) {
                warn!(pgid = self.pgid.as_raw(); "Node teardown on drop failed: {e}");
            }
        }
    }
}

impl NodeProcess {
    /// Spawns `[script, ...args]` with a piped stdout as the leader of a fresh process group.
    ///
    /// `args` is split with shell quoting rules; the script path is used as-is.
    pub fn start(script: &Path, args: Option<&str>, grace_period: Duration) -> HarnessResult<Self> {
        if script.as_os_str().is_empty() {
            return Err(HarnessError::ConfigurationMissing);
        }
        let args = match args {
            Some(args) => split_args(args)?,
            None => Vec::new(),
        };

        let mut child = Command::new(script)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .process_group(0)
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                script: script.to_path_buf(),
                source,
            })?;

        #[allow(clippy::cast_possible_wrap)]
        let pid = Pid::from_raw(child.id() as i32);
        // The child leads its own group, so its pid doubles as the group id if it already exited
        let pgid = getpgid(Some(pid)).unwrap_or(pid);
        let stdout = child.stdout.take().map(BufReader::new);

        info!(
            script:% = script.display(),
            args:? = args,
            pid = pid.as_raw(),
            pgid = pgid.as_raw();
            "Node process spawned"
        );

        Ok(Self {
            child,
            pgid,
            state: NodeState::Starting,
            grace_period,
            script: script.to_path_buf(),
            stdout,
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn pgid(&self) -> i32 {
        self.pgid.as_raw()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: NodeState) {
        self.state = state;
    }

    /// The node's stdout as a line source. Lines not consumed by the readiness monitor stay here.
    pub fn stdout_mut(&mut self) -> Option<&mut BufReader<ChildStdout>> {
        self.stdout.as_mut()
    }

    /// Hands the rest of the node's stdout to the caller, e.g. to keep a long-lived node drained.
    pub fn take_stdout(&mut self) -> Option<BufReader<ChildStdout>> {
        self.stdout.take()
    }

    /// Stops the whole process group and reaps the leader. Calling it again is a no-op.
    pub fn teardown(&mut self) -> HarnessResult<TeardownReport> {
        teardown::teardown(self)
    }
}

/// Splits an argument string the way a POSIX shell would, without expansions.
///
/// Supports whitespace separation, single quotes, double quotes and backslash escapes.
pub fn split_args(input: &str) -> HarnessResult<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            },
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(invalid_args("unclosed single quote", input)),
                    }
                }
            },
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            },
                            None => return Err(invalid_args("unclosed double quote", input)),
                        },
                        Some(c) => current.push(c),
                        None => return Err(invalid_args("unclosed double quote", input)),
                    }
                }
            },
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(invalid_args("trailing backslash", input)),
                }
            },
            c => {
                in_word = true;
                current.push(c);
            },
        }
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

fn invalid_args(problem: &str, input: &str) -> HarnessError {
    HarnessError::InvalidArguments(format!("{problem} in {input:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(split_args("  --no-purge   --build-only ").unwrap(), vec!["--no-purge", "--build-only"]);
        assert!(split_args("").unwrap().is_empty());
    }

    #[test]
    fn honours_quotes_and_escapes() {
        assert_eq!(
            split_args(r#"--name 'alice bob' --msg "say \"hi\"" a\ b"#).unwrap(),
            vec!["--name", "alice bob", "--msg", r#"say "hi""#, "a b"]
        );
        assert_eq!(split_args("''").unwrap(), vec![""]);
    }

    #[test]
    fn rejects_unbalanced_quotes() {
        assert!(matches!(split_args("'open"), Err(HarnessError::InvalidArguments(_))));
        assert!(matches!(split_args("\"open"), Err(HarnessError::InvalidArguments(_))));
        assert!(matches!(split_args("dangling\\"), Err(HarnessError::InvalidArguments(_))));
    }

    #[test]
    fn empty_script_is_missing_configuration() {
        let err = NodeProcess::start(Path::new(""), None, Duration::from_millis(10)).unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn missing_script_fails_to_spawn() {
        let err = NodeProcess::start(Path::new("/nonexistent/localnet.sh"), None, Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }));
    }
}
