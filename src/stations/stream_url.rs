//! Best-effort rewriting of raw stream endpoints into directly playable URLs.
//!
//! Shoutcast-style servers answer on the bare `host:port` with an HTML status
//! page and only stream audio when a path follows `;`. The rewrite uses one
//! convention throughout: a path separator, then `;`, then the default
//! filename (`http://host:8000/;stream.mp3`).
//!
//! | raw suffix                         | rewrite                          |
//! |------------------------------------|----------------------------------|
//! | (empty)                            | (empty)                          |
//! | `.mp3` `.aac` `.ogg` `.m3u8`       | unchanged                        |
//! | `/;`                               | append `stream.mp3`              |
//! | `;`                                | `;` becomes `/;stream.mp3`       |
//! | `:<port>` or `:<port>/`, no path   | append `/;stream.mp3`            |
//! | anything else                      | unchanged                        |
//!
//! Every rewritten URL ends in `.mp3`, so applying the function twice is the
//! same as applying it once.

pub const DEFAULT_STREAM_FILE: &str = "stream.mp3";

const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".aac", ".ogg", ".m3u8"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamShape {
    Empty,
    AudioFile,
    SlashSemicolon,
    BareSemicolon,
    PortOnly { trailing_slash: bool },
    Other,
}

fn classify(raw: &str) -> StreamShape {
    if raw.is_empty() {
        return StreamShape::Empty;
    }
    if has_audio_extension(raw) {
        return StreamShape::AudioFile;
    }
    if raw.ends_with("/;") {
        return StreamShape::SlashSemicolon;
    }
    if raw.ends_with(';') {
        return StreamShape::BareSemicolon;
    }
    let trailing_slash = raw.ends_with('/');
    if ends_with_port(raw.strip_suffix('/').unwrap_or(raw)) {
        return StreamShape::PortOnly { trailing_slash };
    }
    StreamShape::Other
}

pub fn normalize_stream(raw: &str) -> String {
    let trimmed = raw.trim();
    match classify(trimmed) {
        StreamShape::Empty => String::new(),
        StreamShape::AudioFile | StreamShape::Other => trimmed.to_string(),
        StreamShape::SlashSemicolon => format!("{trimmed}{DEFAULT_STREAM_FILE}"),
        StreamShape::BareSemicolon => {
            let base = &trimmed[..trimmed.len() - 1];
            format!("{base}/;{DEFAULT_STREAM_FILE}")
        }
        StreamShape::PortOnly { trailing_slash } => {
            let separator = if trailing_slash { "" } else { "/" };
            format!("{trimmed}{separator};{DEFAULT_STREAM_FILE}")
        }
    }
}

fn has_audio_extension(raw: &str) -> bool {
    let path = raw
        .split(['?', '#'])
        .next()
        .unwrap_or(raw)
        .to_ascii_lowercase();
    AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// True for `scheme://host:1234` with nothing after the port.
fn ends_with_port(raw: &str) -> bool {
    let Some((_, rest)) = raw.split_once("://") else {
        return false;
    };
    if rest.contains(['/', '?', '#']) {
        return false;
    }
    match rest.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
