//! `RUN` directives that recreate one embedded file inside the image.

/// Prefix of every emitted build step.
const STEP: &str = "RUN";

/// Emits the two build steps for one file, in order:
///
/// 1. `RUN mkdir -p '<parent>'` (`.` for top-level files)
/// 2. `RUN echo '<payload>' | base64 -d | gunzip > '<path>'`
///
/// `relative_path` must be `/`-separated and relative to the build root.
/// `payload` must come from [`crate::encode::encode`].
pub fn emit(relative_path: &str, payload: &str) -> Result<[String; 2], DirectiveError> {
    if relative_path.is_empty() || relative_path.contains(['\n', '\r', '\0']) {
        return Err(DirectiveError::UnrepresentablePath(relative_path.to_owned()));
    }
    if !payload
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
    {
        return Err(DirectiveError::UnsafePayload(relative_path.to_owned()));
    }

    let parent = relative_path
        .rsplit_once('/')
        .map_or(".", |(parent, _)| parent);

    Ok([
        format!("{STEP} mkdir -p {}", shell_quote(parent)),
        format!(
            "{STEP} echo '{payload}' | base64 -d | gunzip > {}",
            shell_quote(relative_path)
        ),
    ])
}

/// Extracts the payload from a write step produced by [`emit`].
pub fn parse_write(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(STEP)?.strip_prefix(" echo '")?;
    let (payload, tail) = rest.split_once('\'')?;
    tail.starts_with(" | base64 -d | gunzip > ")
        .then_some(payload)
}

/// Wraps `s` in single quotes; embedded `'` becomes `'"'"'`.
fn shell_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("'\"'\"'");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    #[error("path {0:?} cannot be written as a single Dockerfile line")]
    UnrepresentablePath(String),
    #[error("payload for {0:?} contains characters outside the base64 alphabet")]
    UnsafePayload(String),
}
