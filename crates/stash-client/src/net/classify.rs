//! Transient-fault classification for transport errors.
//!
//! Retryability is decided here, once, by inspecting the error's source
//! chain — never by matching message text deeper in the stack. Anything that
//! does not classify into [`TransientFault`] is non-retryable.

use hyper_util::client::legacy;
use thiserror::Error;

/// The closed set of transport failures the retry layer will retry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransientFault {
    /// The peer refused the TCP connection.
    #[error("connection refused")]
    ConnectionRefused,

    /// The connection was reset or aborted mid-request.
    #[error("connection reset")]
    ConnectionReset,

    /// The peer hung up before a complete response arrived.
    #[error("connection closed before the response completed")]
    ConnectionClosed,

    /// Hostname resolution failed.
    #[error("dns resolution failed")]
    DnsFailure,

    /// The attempt exceeded its time budget.
    #[error("request timed out")]
    Timeout,
}

/// Classify a client error into a [`TransientFault`], or `None` when it is
/// not retryable.
///
/// The source chain is walked innermost-first for an [`std::io::Error`] with
/// a recognisable kind, then for hyper's own connection predicates. A
/// connect-phase failure with no clearer cause (resolver errors surface this
/// way) falls back to [`TransientFault::DnsFailure`].
pub fn classify(error: &legacy::Error) -> Option<TransientFault> {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            use std::io::ErrorKind;
            match io.kind() {
                ErrorKind::ConnectionRefused => return Some(TransientFault::ConnectionRefused),
                ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe => return Some(TransientFault::ConnectionReset),
                ErrorKind::UnexpectedEof => return Some(TransientFault::ConnectionClosed),
                ErrorKind::TimedOut => return Some(TransientFault::Timeout),
                _ => {}
            }
        }
        if let Some(hyper_error) = current.downcast_ref::<hyper::Error>() {
            if hyper_error.is_incomplete_message() || hyper_error.is_closed() {
                return Some(TransientFault::ConnectionClosed);
            }
            if hyper_error.is_timeout() {
                return Some(TransientFault::Timeout);
            }
        }
        source = current.source();
    }

    if error.is_connect() {
        return Some(TransientFault::DnsFailure);
    }
    None
}
