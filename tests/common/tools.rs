//! Stand-ins for the net-snmp tools.
//!
//! Each tool is a shell script printing a canned response, so process
//! backend tests run without an agent or the real binaries.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory of fake net-snmp tools.
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Install `name` printing `stdout` and exiting with `status`.
    pub fn respond(&self, name: &str, stdout: &str, status: i32) -> &Self {
        let data = self.dir.path().join(format!("{}.out", name));
        std::fs::write(&data, stdout).unwrap();
        self.script(
            name,
            &format!("#!/bin/sh\ncat '{}'\nexit {}\n", data.display(), status),
        )
    }

    /// Install `name` printing `message` on stderr and failing.
    pub fn fail(&self, name: &str, message: &str) -> &Self {
        let script = format!("#!/bin/sh\necho '{}' >&2\nexit 1\n", message);
        self.script(name, &script)
    }

    /// Install `name` that never finishes on its own.
    pub fn hang(&self, name: &str) -> &Self {
        self.script(name, "#!/bin/sh\nexec sleep 30\n")
    }

    /// Install `name` writing its arguments to `<name>.args`, one per line.
    pub fn record_args(&self, name: &str) -> PathBuf {
        let args = self.dir.path().join(format!("{}.args", name));
        self.script(
            name,
            &format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n", args.display()),
        );
        args
    }

    fn script(&self, name: &str, body: &str) -> &Self {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        self
    }
}
