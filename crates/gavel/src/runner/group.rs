//! Process group ownership for test programs
//!
//! Every test program is spawned as the leader of a fresh process group, so
//! interpreters, build drivers and anything they fork share one group id.

use tracing::debug;

/// Kills the whole process group of a test program
///
/// The group is killed once the leader has exited, or when this value is
/// dropped, whichever comes first.
#[derive(Debug)]
pub(crate) struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    /// Take ownership of the group led by the given child
    pub(crate) fn new(leader: Option<u32>) -> Self {
        Self { pgid: leader }
    }

    pub(crate) fn id(&self) -> Option<u32> {
        self.pgid
    }

    /// Send SIGKILL to every process in the group; later calls do nothing
    pub(crate) fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    // kill(0) and kill(-1) address the caller's group and every process
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    if pgid <= 1 {
        return;
    }

    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc == 0 {
        debug!(pgid, "process group killed");
    } else {
        debug!(pgid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}
