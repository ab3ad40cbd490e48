use std::io;

use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The byte source failed; unrecoverable.
    #[error("read failed: {0}")]
    Source(#[from] io::Error),
    /// The input violates the packet grammar.
    #[error("format error: {0}")]
    Format(String),
    /// A dispatch on an algorithm the engine cannot handle.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

#[macro_export]
macro_rules! format_err {
    ($($arg:tt)*) => {
        $crate::errors::Error::Format(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::errors::Error::Format(format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! unsupported_err {
    ($($arg:tt)*) => {
        return Err($crate::errors::Error::Unsupported(format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            bail!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr, $($arg:tt)*) => {{
        let (left, right) = (&$left, &$right);
        if left != right {
            bail!("{} ({:?} != {:?})", format!($($arg)*), left, right);
        }
    }};
}
