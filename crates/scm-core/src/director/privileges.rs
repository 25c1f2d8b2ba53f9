use std::fmt::Debug;
use std::path::Path;

use crate::config::Id;
use crate::kernel::error::{Error, Result};

/// Changes file ownership and process credentials after startup.
pub trait PrivilegeManager: Send + Sync + Debug {
    /// Change the owner of `path` and everything below it.
    fn chown_recursive(&self, path: &Path, uid: u32, gid: u32) -> Result<()>;
    fn set_gid(&self, gid: u32) -> Result<()>;
    fn set_uid(&self, uid: u32) -> Result<()>;

    /// Look up the id of the user called `name`.
    fn user_id(&self, name: &str) -> Result<u32> {
        Err(Error::Privilege {
            message: format!("cannot resolve user '{}'", name),
        })
    }

    /// Look up the id of the group called `name`.
    fn group_id(&self, name: &str) -> Result<u32> {
        Err(Error::Privilege {
            message: format!("cannot resolve group '{}'", name),
        })
    }
}

/// Numeric user and group ids for the configured `setuid`/`setgid`.
pub fn resolve_ids(
    privileges: &dyn PrivilegeManager,
    uid: Option<&Id>,
    gid: Option<&Id>,
) -> Result<(Option<u32>, Option<u32>)> {
    let uid = match uid {
        Some(Id::Numeric(id)) => Some(*id),
        Some(Id::Name(name)) => Some(privileges.user_id(name)?),
        None => None,
    };
    let gid = match gid {
        Some(Id::Numeric(id)) => Some(*id),
        Some(Id::Name(name)) => Some(privileges.group_id(name)?),
        None => None,
    };
    Ok((uid, gid))
}

/// Drop privileges once components are running.
///
/// The data directory is handed over only when both ids are configured. The
/// group must be changed before the user.
pub fn apply_privileges(
    privileges: &dyn PrivilegeManager,
    data_dir: Option<&Path>,
    uid: Option<u32>,
    gid: Option<u32>,
) -> Result<()> {
    if let (Some(dir), Some(uid), Some(gid)) = (data_dir, uid, gid) {
        log::debug!("changing owner of {} to {}:{}", dir.display(), uid, gid);
        privileges.chown_recursive(dir, uid, gid)?;
    }
    if let Some(gid) = gid {
        privileges.set_gid(gid)?;
    }
    if let Some(uid) = uid {
        privileges.set_uid(uid)?;
    }
    Ok(())
}

/// Applies changes to the running process through `libc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessPrivileges;

#[cfg(unix)]
impl ProcessPrivileges {
    fn c_name(name: &str) -> Result<std::ffi::CString> {
        std::ffi::CString::new(name).map_err(|e| Error::Privilege {
            message: format!("invalid name '{}': {}", name, e),
        })
    }

    fn lchown(path: &Path, uid: u32, gid: u32) -> Result<()> {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|e| Error::Privilege {
            message: format!("invalid path {}: {}", path.display(), e),
        })?;
        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
        let rc = unsafe { libc::lchown(c_path.as_ptr(), uid, gid) };
        if rc != 0 {
            return Err(Error::io(std::io::Error::last_os_error(), "chown", path));
        }
        Ok(())
    }
}

#[cfg(unix)]
impl PrivilegeManager for ProcessPrivileges {
    fn chown_recursive(&self, path: &Path, uid: u32, gid: u32) -> Result<()> {
        Self::lchown(path, uid, gid)?;
        let metadata = std::fs::symlink_metadata(path).map_err(|e| Error::io(e, "stat", path))?;
        if metadata.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|e| Error::io(e, "read directory", path))?;
            for entry in entries {
                let entry = entry.map_err(|e| Error::io(e, "read directory", path))?;
                self.chown_recursive(&entry.path(), uid, gid)?;
            }
        }
        Ok(())
    }

    fn set_gid(&self, gid: u32) -> Result<()> {
        // SAFETY: setgid has no memory-safety preconditions.
        if unsafe { libc::setgid(gid) } != 0 {
            return Err(Error::Privilege {
                message: format!("setgid({}): {}", gid, std::io::Error::last_os_error()),
            });
        }
        Ok(())
    }

    fn set_uid(&self, uid: u32) -> Result<()> {
        // SAFETY: setuid has no memory-safety preconditions.
        if unsafe { libc::setuid(uid) } != 0 {
            return Err(Error::Privilege {
                message: format!("setuid({}): {}", uid, std::io::Error::last_os_error()),
            });
        }
        Ok(())
    }

    fn user_id(&self, name: &str) -> Result<u32> {
        let c_name = Self::c_name(name)?;
        // SAFETY: c_name outlives the call; the returned entry is read before any other lookup.
        let entry = unsafe { libc::getpwnam(c_name.as_ptr()) };
        if entry.is_null() {
            return Err(Error::Privilege {
                message: format!("unknown user '{}'", name),
            });
        }
        // SAFETY: entry is non-null and points to libc's static passwd record.
        Ok(unsafe { (*entry).pw_uid })
    }

    fn group_id(&self, name: &str) -> Result<u32> {
        let c_name = Self::c_name(name)?;
        // SAFETY: c_name outlives the call; the returned entry is read before any other lookup.
        let entry = unsafe { libc::getgrnam(c_name.as_ptr()) };
        if entry.is_null() {
            return Err(Error::Privilege {
                message: format!("unknown group '{}'", name),
            });
        }
        // SAFETY: entry is non-null and points to libc's static group record.
        Ok(unsafe { (*entry).gr_gid })
    }
}

#[cfg(not(unix))]
impl PrivilegeManager for ProcessPrivileges {
    fn chown_recursive(&self, path: &Path, _uid: u32, _gid: u32) -> Result<()> {
        Err(Error::Privilege {
            message: format!("cannot change owner of {} on this platform", path.display()),
        })
    }

    fn set_gid(&self, _gid: u32) -> Result<()> {
        Err(Error::Privilege {
            message: "setgid is not supported on this platform".to_string(),
        })
    }

    fn set_uid(&self, _uid: u32) -> Result<()> {
        Err(Error::Privilege {
            message: "setuid is not supported on this platform".to_string(),
        })
    }
}
