//! Owned handles to launched service processes.

use std::fs::File;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use gwasbench_core::cancel::CancellationToken;
use gwasbench_core::constants::{POLL_INTERVAL, SHUTDOWN_GRACE};
use gwasbench_core::error::BenchError;

use crate::command::CommandSpec;
use crate::readiness::ReadinessProbe;

/// How to launch one service.
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    /// Name used in logs and errors.
    pub name: String,
    pub command: CommandSpec,
    /// Working directory of the child; never the harness's own.
    pub working_dir: PathBuf,
    /// Directory for `<name>.stdout.log` / `<name>.stderr.log`; inherit when `None`.
    pub log_dir: Option<PathBuf>,
}

impl ServiceSpec {
    fn stdio(&self, stream: &str) -> Result<Stdio, BenchError> {
        match &self.log_dir {
            Some(dir) => {
                let path = dir.join(format!("{}.{stream}.log", self.name));
                let file = File::create(&path).map_err(|e| BenchError::io(&path, e))?;
                Ok(Stdio::from(file))
            }
            None => Ok(Stdio::inherit()),
        }
    }
}

/// A running child process owned by the harness.
///
/// On unix the child leads its own process group, so anything it forks
/// (a server started by `make run`, for instance) is torn down with it.
/// Dropping the handle terminates the whole group.
#[derive(Debug)]
pub struct ServiceProcess {
    name: String,
    child: Child,
    started: Instant,
    exit: Option<ExitStatus>,
}

impl ServiceProcess {
    /// Launch `spec` without waiting for it.
    pub fn spawn(spec: &ServiceSpec) -> Result<Self, BenchError> {
        if !spec.working_dir.is_dir() {
            return Err(BenchError::MissingArtifact(spec.working_dir.clone()));
        }
        if let Some(dir) = &spec.log_dir {
            std::fs::create_dir_all(dir).map_err(|e| BenchError::io(dir, e))?;
        }

        let program = spec.command.resolved_program(&spec.working_dir);
        let mut command = Command::new(&program);
        command
            .args(&spec.command.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(spec.stdio("stdout")?)
            .stderr(spec.stdio("stderr")?);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let child = command
            .spawn()
            .map_err(|source| BenchError::ProcessSpawn {
                service: spec.name.clone(),
                program: program.display().to_string(),
                source,
            })?;

        tracing::info!(
            service = %spec.name,
            pid = child.id(),
            command = %spec.command,
            dir = %spec.working_dir.display(),
            "started service"
        );
        Ok(Self {
            name: spec.name.clone(),
            child,
            started: Instant::now(),
            exit: None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time since launch.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Exit status if the process has finished, without blocking.
    pub fn try_status(&mut self) -> Result<Option<ExitStatus>, BenchError> {
        if self.exit.is_none() {
            self.exit = self
                .child
                .try_wait()
                .map_err(|e| BenchError::io(&self.name, e))?;
        }
        Ok(self.exit)
    }

    /// Whether the process is still alive.
    pub fn is_running(&mut self) -> Result<bool, BenchError> {
        Ok(self.try_status()?.is_none())
    }

    /// Fail with [`BenchError::ProcessExited`] if the process has died.
    pub fn ensure_running(&mut self) -> Result<(), BenchError> {
        match self.try_status()? {
            None => Ok(()),
            Some(status) => Err(BenchError::ProcessExited {
                service: self.name.clone(),
                status: status.to_string(),
            }),
        }
    }

    /// Block until the process exits, polling so that cancellation and
    /// the optional timeout are honoured. A non-zero exit is an error.
    pub fn wait(
        &mut self,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<ExitStatus, BenchError> {
        self.wait_alongside(&mut [], cancel, timeout)
    }

    /// Like [`wait`](Self::wait), but also fails with
    /// [`BenchError::ProcessExited`] when one of `companions` dies with a
    /// failure status before this process finishes.
    pub fn wait_alongside(
        &mut self,
        companions: &mut [ServiceProcess],
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<ExitStatus, BenchError> {
        let start = Instant::now();
        loop {
            if let Some(status) = self.try_status()? {
                tracing::info!(service = %self.name, %status, elapsed = ?self.uptime(), "service exited");
                if status.success() {
                    return Ok(status);
                }
                // Cancellation may have raced with the child's own exit.
                cancel.check_cancelled()?;
                return Err(BenchError::ProcessFailed {
                    service: self.name.clone(),
                    status: status.to_string(),
                });
            }
            for companion in companions.iter_mut() {
                if let Some(status) = companion.try_status()? {
                    if !status.success() {
                        self.terminate();
                        return Err(BenchError::ProcessExited {
                            service: companion.name.clone(),
                            status: status.to_string(),
                        });
                    }
                }
            }
            if cancel.is_cancelled() {
                self.terminate();
                return Err(BenchError::Cancelled);
            }
            if let Some(limit) = timeout {
                if start.elapsed() >= limit {
                    self.terminate();
                    return Err(BenchError::Timeout(limit));
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Block until `probe` reports the service ready.
    pub fn await_ready(
        &mut self,
        probe: &ReadinessProbe,
        cancel: &CancellationToken,
    ) -> Result<Duration, BenchError> {
        probe.await_ready(self, cancel)
    }

    /// Stop the process and everything it spawned, then reap it.
    ///
    /// The process group gets SIGTERM first and SIGKILL once
    /// [`SHUTDOWN_GRACE`] has passed.
    pub fn terminate(&mut self) {
        if let Err(e) = self.try_status() {
            tracing::warn!(service = %self.name, error = %e, "could not query service");
        }
        #[cfg(unix)]
        self.drain_group();
        if self.exit.is_some() {
            return;
        }
        if let Err(e) = self.child.kill() {
            tracing::warn!(service = %self.name, error = %e, "kill failed");
        }
        match self.child.wait() {
            Ok(status) => {
                tracing::debug!(service = %self.name, %status, "terminated service");
                self.exit = Some(status);
            }
            Err(e) => tracing::warn!(service = %self.name, error = %e, "could not reap service"),
        }
    }

    #[cfg(unix)]
    fn drain_group(&mut self) {
        use nix::sys::signal::Signal;

        let pgid = self.child.id();
        if !group::signal(pgid, Some(Signal::SIGTERM)) {
            return;
        }
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while Instant::now() < deadline {
            // An unreaped leader keeps the group alive.
            if let Err(e) = self.try_status() {
                tracing::warn!(service = %self.name, error = %e, "could not query service");
            }
            if self.exit.is_some() && !group::signal(pgid, None) {
                tracing::debug!(service = %self.name, "process group drained");
                return;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        tracing::warn!(
            service = %self.name,
            grace = ?SHUTDOWN_GRACE,
            "process group ignored SIGTERM, killing"
        );
        group::signal(pgid, Some(Signal::SIGKILL));
    }
}

#[cfg(unix)]
mod group {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    /// Send `signal` to the process group led by `leader`; `None` only
    /// checks for members. Returns false once the group is empty.
    pub(super) fn signal(leader: u32, sig: Option<Signal>) -> bool {
        let Ok(raw) = i32::try_from(leader) else {
            return false;
        };
        match killpg(Pid::from_raw(raw), sig) {
            Ok(()) => true,
            Err(Errno::ESRCH) => false,
            Err(e) => {
                tracing::warn!(pgid = leader, error = %e, "could not signal process group");
                false
            }
        }
    }
}

impl Drop for ServiceProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn sh(name: &str, dir: &Path, script: &str) -> ServiceSpec {
        ServiceSpec {
            name: name.into(),
            command: CommandSpec::new("sh").arg("-c").arg(script),
            working_dir: dir.to_path_buf(),
            log_dir: None,
        }
    }

    #[test]
    fn runs_in_its_own_working_dir() {
        let dir = TempDir::new().unwrap();
        let mut proc = ServiceProcess::spawn(&sh("touch", dir.path(), "touch here.txt")).unwrap();
        proc.wait(&CancellationToken::new(), None).unwrap();
        assert!(dir.path().join("here.txt").exists());
    }

    #[test]
    fn non_zero_exit_is_process_failed() {
        let dir = TempDir::new().unwrap();
        let mut proc = ServiceProcess::spawn(&sh("fail", dir.path(), "exit 3")).unwrap();
        let err = proc.wait(&CancellationToken::new(), None).unwrap_err();
        assert!(matches!(err, BenchError::ProcessFailed { ref service, .. } if service == "fail"));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = TempDir::new().unwrap();
        let spec = ServiceSpec {
            name: "ghost".into(),
            command: CommandSpec::new("./does-not-exist"),
            working_dir: dir.path().to_path_buf(),
            log_dir: None,
        };
        assert!(matches!(
            ServiceProcess::spawn(&spec),
            Err(BenchError::ProcessSpawn { .. })
        ));
    }

    #[test]
    fn missing_working_dir() {
        let spec = sh("nowhere", Path::new("/nonexistent/gwasbench"), "true");
        assert!(matches!(
            ServiceProcess::spawn(&spec),
            Err(BenchError::MissingArtifact(_))
        ));
    }

    #[test]
    fn terminate_stops_long_running_child() {
        let dir = TempDir::new().unwrap();
        let mut proc = ServiceProcess::spawn(&sh("sleeper", dir.path(), "sleep 30")).unwrap();
        assert!(proc.is_running().unwrap());
        proc.terminate();
        assert!(!proc.is_running().unwrap());
    }

    /// Whether `pid` is a live process; zombies count as gone.
    #[cfg(target_os = "linux")]
    fn alive(pid: u32) -> bool {
        std::fs::read_to_string(format!("/proc/{pid}/stat")).is_ok_and(|stat| {
            stat.rsplit_once(") ")
                .is_some_and(|(_, rest)| !rest.starts_with('Z'))
        })
    }

    /// Poll for up to five seconds until `pid` is gone.
    #[cfg(target_os = "linux")]
    fn gone_soon(pid: u32) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if !alive(pid) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    /// Read a pid written by a stand-in service, waiting for the file.
    #[cfg(target_os = "linux")]
    fn read_pid(path: &Path) -> u32 {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Ok(text) = std::fs::read_to_string(path) {
                if let Ok(pid) = text.trim().parse() {
                    return pid;
                }
            }
            assert!(Instant::now() < deadline, "no pid in {}", path.display());
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn terminate_stops_forked_children() {
        let dir = TempDir::new().unwrap();
        let script = "sleep 300 & echo $! > server.pid; wait";
        let mut proc = ServiceProcess::spawn(&sh("make", dir.path(), script)).unwrap();
        let server = read_pid(&dir.path().join("server.pid"));
        assert!(alive(server));

        proc.terminate();
        assert!(!proc.is_running().unwrap());
        assert!(gone_soon(server), "forked server {server} outlived its service");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn drop_stops_forked_children() {
        let dir = TempDir::new().unwrap();
        let script = "sleep 300 & echo $! > server.pid; wait";
        let proc = ServiceProcess::spawn(&sh("make", dir.path(), script)).unwrap();
        let server = read_pid(&dir.path().join("server.pid"));
        drop(proc);
        assert!(gone_soon(server));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn sigterm_resistant_group_is_killed() {
        let dir = TempDir::new().unwrap();
        let script = "trap '' TERM; sleep 300 & echo $! > server.pid; while :; do sleep 1; done";
        let mut proc = ServiceProcess::spawn(&sh("stubborn", dir.path(), script)).unwrap();
        let server = read_pid(&dir.path().join("server.pid"));
        let start = Instant::now();
        proc.terminate();
        assert!(start.elapsed() >= SHUTDOWN_GRACE);
        assert!(!proc.is_running().unwrap());
        assert!(gone_soon(server));
    }

    #[test]
    fn timeout_kills_child() {
        let dir = TempDir::new().unwrap();
        let mut proc = ServiceProcess::spawn(&sh("sleeper", dir.path(), "sleep 30")).unwrap();
        let err = proc
            .wait(&CancellationToken::new(), Some(Duration::from_millis(100)))
            .unwrap_err();
        assert!(matches!(err, BenchError::Timeout(_)));
        assert!(!proc.is_running().unwrap());
    }

    #[test]
    fn cancellation_kills_child() {
        let dir = TempDir::new().unwrap();
        let mut proc = ServiceProcess::spawn(&sh("sleeper", dir.path(), "sleep 30")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(proc.wait(&cancel, None), Err(BenchError::Cancelled)));
    }

    #[test]
    fn failing_companion_interrupts_wait() {
        let dir = TempDir::new().unwrap();
        let mut main = ServiceProcess::spawn(&sh("compute", dir.path(), "sleep 30")).unwrap();
        let companion = ServiceProcess::spawn(&sh("provider", dir.path(), "exit 2")).unwrap();
        let err = main
            .wait_alongside(&mut [companion], &CancellationToken::new(), None)
            .unwrap_err();
        assert!(matches!(err, BenchError::ProcessExited { ref service, .. } if service == "provider"));
        assert!(!main.is_running().unwrap());
    }

    #[test]
    fn output_goes_to_log_files() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let mut spec = sh("echoer", dir.path(), "echo out; echo err >&2");
        spec.log_dir = Some(logs.clone());
        let mut proc = ServiceProcess::spawn(&spec).unwrap();
        proc.wait(&CancellationToken::new(), None).unwrap();
        assert_eq!(
            std::fs::read_to_string(logs.join("echoer.stdout.log")).unwrap(),
            "out\n"
        );
        assert_eq!(
            std::fs::read_to_string(logs.join("echoer.stderr.log")).unwrap(),
            "err\n"
        );
    }
}
