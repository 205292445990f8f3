use std::error::Error as StdError;

const MAX_ERROR_MESSAGE_LEN: usize = 256;

pub(crate) fn truncate_message(body: &str) -> String {
    let compact = body.trim().replace(['\r', '\n'], " ");
    compact.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

/// Flattens an error and its sources into one line, e.g. "error sending request: connection refused".
pub(crate) fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::{error_chain, truncate_message};

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("error sending request")
        }
    }

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    impl std::error::Error for Inner {}

    #[test]
    fn truncate_message_compacts_newlines_and_limits_length() {
        assert_eq!(truncate_message("line-1\nline-2\r\n"), "line-1 line-2");

        let long = "x".repeat(512);
        assert_eq!(truncate_message(&long).len(), 256);
    }

    #[test]
    fn error_chain_appends_sources() {
        assert_eq!(
            error_chain(&Outer(Inner)),
            "error sending request: connection refused"
        );
    }
}
