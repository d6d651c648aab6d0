use crate::error::RemoteLockError;

pub fn get_exit_code(error: &RemoteLockError) -> i32 {
    match error {
        RemoteLockError::ConfigError(_) | RemoteLockError::InvalidConfig(_) => 2,

        RemoteLockError::InvalidAdapter(_) => 3,

        RemoteLockError::Store(_) | RemoteLockError::Io(_) => 74, // EX_IOERR

        RemoteLockError::LockAcquisitionFailed { .. } => 75, // EX_TEMPFAIL

        _ => 1,
    }
}
