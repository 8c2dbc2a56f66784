/*
 * Turns a user-supplied root into a remote session when it names an FTP location. Local roots
 * pass through untouched.
 */
use crate::core::{FtpSession, RemoteAddress, RemoteError, RemoteHandle};
use std::sync::{Arc, Mutex};

pub const ANONYMOUS_USER: &str = "anonymous";

// An established remote root: the shared session and the root as it is displayed and reported.
pub struct RemoteRoot {
    pub handle: RemoteHandle,
    pub display_root: String,
}

/*
 * Returns `None` when `root` is not a remote location. Otherwise connects and logs in, with
 * anonymous credentials when no user is given, and positions the session at the root's directory.
 */
pub fn connect_remote_root(
    root: &str,
    user: Option<&str>,
    password: Option<&str>,
) -> Option<Result<RemoteRoot, RemoteError>> {
    let address = match RemoteAddress::parse(root)? {
        Ok(address) => address,
        Err(e) => return Some(Err(e)),
    };
    let user = user.unwrap_or(ANONYMOUS_USER);
    let password = password.unwrap_or("");

    Some(FtpSession::connect(&address, user, password).map(|session| {
        let handle: RemoteHandle = Arc::new(Mutex::new(session));
        RemoteRoot {
            handle,
            display_root: address.display_root(),
        }
    }))
}
