pub use alloy_primitives;

pub mod cancel;
pub mod chain;
pub mod consts;
pub mod error;
pub mod fs;
pub mod keys;
pub mod numeric;

pub use self::cancel::{cancellable, CancellationToken};
pub use self::error::{Error, ErrorKind, Result};
pub use self::keys::{KeyAlgo, PrivateKey, PublicKey};
