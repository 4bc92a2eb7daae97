//! Script generation for dockscript.
//!
//! # Pipeline
//!
//! ```text
//! dockscript --path <dir>
//!   1. Locate    ── first WORKDIR, else first FROM, else before first COPY/ADD
//!   2. Matcher   ── first existing of .gitignore / .dockerignore
//!   3. Walk      ── sorted depth-first traversal, ignored paths pruned
//!   4. Encode    ── gzip → base64 per file
//!   5. Emit      ── RUN mkdir -p <parent> + RUN echo <payload> | base64 -d | gunzip > <path>
//!   6. Persist   ── temp file in <dir>, chmod 755, rename to Dockerfile.script
//! ```
//!
//! # Exclusions
//!
//! Independent of the active ignore file, the following are never embedded:
//! - the Dockerfile itself and the generated script
//! - the in-flight temporary output file
//! - `[script].exclude` entries (`.git` by default)

pub mod directive;
pub mod encode;
pub mod locate;
pub mod matcher;
pub mod script;
pub mod walk;

pub use locate::{InsertionPoint, locate};
pub use matcher::IgnoreMatcher;
pub use script::{
    AssemblySummary, ScriptAssembler, ScriptError, Shebang, verify_script, write_script,
};
