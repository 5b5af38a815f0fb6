//! Lua-canonical chunk names.
//!
//! Guest code tells string chunks and file chunks apart by the first byte of
//! `source`: `@` for files, `=` for literal names, `[` for native code, and no
//! prefix for chunks loaded from in-memory text. [`ChunkSource::resolve`]
//! picks the first rule that applies:
//!
//! 1. a script path that already carries one of those prefixes is used verbatim;
//! 2. a span with an origin URL becomes `@<file name>`, or `=(command line)`
//!    for command-line style origins;
//! 3. any other script path is a string chunk name and is used unprefixed;
//! 4. otherwise the chunk is native: `=[C]`.

use crate::span::SourceSpan;
use crate::vm::{Frame, FrameKind, value::Function};
use serde::Serialize;

pub const NATIVE_SOURCE: &str = "=[C]";
pub const NATIVE_SHORT_SRC: &str = "[C]";
pub const COMMAND_LINE_SOURCE: &str = "=(command line)";

/// Longest `short_src` produced for file chunks, in bytes
const SHORT_SRC_LIMIT: usize = 59;

const COMMAND_LINE_ORIGINS: &[&str] = &["-", "-e", "(command line)", "<command line>"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkSource {
    pub source: String,
    pub short_src: String,
}

impl ChunkSource {
    pub fn native() -> Self {
        ChunkSource {
            source: NATIVE_SOURCE.to_string(),
            short_src: NATIVE_SHORT_SRC.to_string(),
        }
    }

    pub fn is_native(&self) -> bool {
        self.source == NATIVE_SOURCE
    }

    pub fn resolve(script_path: Option<&str>, span: Option<&SourceSpan>) -> Self {
        if let Some(path) = script_path.filter(|p| has_source_prefix(p)) {
            let short_src = match path.strip_prefix('@') {
                Some(file) => shorten(file),
                None => path.to_string(),
            };
            return ChunkSource {
                source: path.to_string(),
                short_src,
            };
        }

        if let Some(url) = span.and_then(|s| s.url.as_deref()) {
            return match classify_origin(url) {
                Origin::CommandLine => ChunkSource {
                    source: COMMAND_LINE_SOURCE.to_string(),
                    short_src: COMMAND_LINE_SOURCE[1..].to_string(),
                },
                Origin::File(name) => ChunkSource {
                    source: format!("@{name}"),
                    short_src: shorten(&name),
                },
            };
        }

        match script_path {
            Some(path) => ChunkSource {
                source: path.to_string(),
                short_src: path.to_string(),
            },
            None => ChunkSource::native(),
        }
    }

    /// Source of the code a frame is executing; `fallback` is the
    /// stack-wide script path used by top-level chunks
    pub fn for_frame(frame: &Frame, fallback: Option<&str>) -> Self {
        if frame.kind == FrameKind::Native {
            return ChunkSource::native();
        }
        let path = frame.script_path.as_deref().or(fallback);
        ChunkSource::resolve(path, frame.span.as_ref())
    }

    /// Source a function value was defined in
    pub fn for_function(function: &Function, fallback: Option<&str>) -> Self {
        match function {
            Function::Native(_) => ChunkSource::native(),
            Function::Lua(lua) => {
                let path = lua.chunk_name.as_deref().or(fallback);
                ChunkSource::resolve(path, lua.span.as_ref())
            }
        }
    }
}

fn has_source_prefix(path: &str) -> bool {
    path.starts_with(['@', '=', '['])
}

enum Origin {
    File(String),
    CommandLine,
}

fn classify_origin(url: &str) -> Origin {
    if COMMAND_LINE_ORIGINS.contains(&url) || url.starts_with("data:") {
        return Origin::CommandLine;
    }
    let path = url.strip_prefix("file://").unwrap_or(url);
    let name = path
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(path);
    Origin::File(name.to_string())
}

/// Keep the tail of long file names, marking the cut with "..."
fn shorten(file: &str) -> String {
    if file.len() <= SHORT_SRC_LIMIT {
        return file.to_string();
    }
    let mut start = file.len() - (SHORT_SRC_LIMIT - 3);
    while !file.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &file[start..])
}
