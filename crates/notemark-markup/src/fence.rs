//! Fenced code block detection.
//!
//! Fences use backticks or tildes (three or more). The closing fence
//! must use the same character, be at least as long as the opening
//! fence, and carry nothing but whitespace after it.

/// An opening code fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fence {
    /// Character used for the fence (backtick or tilde).
    marker: char,
    /// Length of the opening fence (minimum length for closing).
    len: usize,
    /// Info string after the fence, if any.
    info: Option<String>,
}

impl Fence {
    /// Language name from the info string: its first whitespace-separated
    /// token, if present.
    pub(crate) fn language(&self) -> Option<&str> {
        self.info.as_deref().and_then(|info| info.split_whitespace().next())
    }
}

/// Detect whether a line opens a code fence.
pub(crate) fn detect_fence(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }

    let len = trimmed.chars().take_while(|&c| c == marker).count();
    if len < 3 {
        return None;
    }

    // Fence characters are ASCII, so `len` is also a byte offset.
    let info = trimmed[len..].trim();
    Some(Fence {
        marker,
        len,
        info: if info.is_empty() {
            None
        } else {
            Some(info.to_owned())
        },
    })
}

/// Check whether a line closes the given fence.
pub(crate) fn is_closing_fence(line: &str, fence: &Fence) -> bool {
    let trimmed = line.trim_start();
    let count = trimmed.chars().take_while(|&c| c == fence.marker).count();
    if count < fence.len {
        return false;
    }

    // After the fence characters, only whitespace is allowed.
    trimmed[count..].chars().all(char::is_whitespace)
}
