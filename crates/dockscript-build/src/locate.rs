//! Finds where embedded-file directives go in the original Dockerfile.

/// Number of original lines written before the embedded directives.
///
/// `InsertionPoint(n)` means the directives follow line `n - 1` and precede
/// line `n`; `InsertionPoint(0)` puts them before the first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPoint(pub usize);

impl InsertionPoint {
    pub fn offset(self) -> usize {
        self.0
    }
}

/// Picks the insertion point:
///
/// 1. After the first `WORKDIR` instruction if the file has one, otherwise
///    after the first `FROM` instruction. A trailing `\` continuation moves
///    the point past the continued lines.
/// 2. Failing that, immediately before the first `COPY` or `ADD`.
///
/// Returns `None` when nothing qualifies; callers append at the end.
pub fn locate<S: AsRef<str>>(lines: &[S]) -> Option<InsertionPoint> {
    let anchor = if lines.iter().any(|l| is_instruction(l.as_ref(), "WORKDIR")) {
        "WORKDIR"
    } else {
        "FROM"
    };

    if let Some(index) = lines.iter().position(|l| is_instruction(l.as_ref(), anchor)) {
        let mut last = index;
        while last + 1 < lines.len() && continues(lines[last].as_ref()) {
            last += 1;
        }
        return Some(InsertionPoint(last + 1));
    }

    lines
        .iter()
        .position(|l| is_instruction(l.as_ref(), "COPY") || is_instruction(l.as_ref(), "ADD"))
        .map(InsertionPoint)
}

/// True when the line's first word is `keyword`, case-insensitively.
fn is_instruction(line: &str, keyword: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case(keyword))
}

fn continues(line: &str) -> bool {
    let trimmed = line.trim_end();
    !trimmed.trim_start().starts_with('#') && trimmed.ends_with('\\')
}
