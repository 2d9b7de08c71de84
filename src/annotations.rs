//! Handler documentation annotations.
//!
//! Handlers describe themselves with `@Tag`-style lines in their doc comments:
//!
//! ```text
//! /// Fetch a single user.
//! ///
//! /// @ID get-user
//! /// @Tag Users
//! /// @Summary Get a user by id
//! /// @Description Looks the user up by primary key.
//! /// Soft-deleted users are not returned.
//! /// @StatusCode 200
//! /// @Error 404 User not found
//! /// @Deprecated
//! ```
//!
//! [`parse_annotations`] turns such a block into a [`HandlerInfo`].
//! [`AnnotationParser`] finds the block for a resolved handler, loading the
//! handler's module into the [`SourceCache`] on first use.

use crate::error::{Error, Result};
use crate::identity::ResolvedIdentity;
use crate::parser::{AstParser, FunctionDecl};
use crate::scanner::FileScanner;
use crate::source_cache::SourceCache;
use crate::status_scan::is_http_status;
use indexmap::IndexSet;
use log::{debug, warn};
use std::path::PathBuf;

/// Documentation-derived description of one handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerInfo {
    /// Operation identifier, unique within the document
    pub id: Option<String>,
    pub tags: IndexSet<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Explicit success status code
    pub status_code: Option<u16>,
    pub deprecated: bool,
    /// Documented error responses as (code, message) pairs
    pub errors: Vec<(u16, String)>,
}

/// An annotation line whose value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedAnnotation {
    pub line: String,
    pub reason: String,
}

impl MalformedAnnotation {
    fn new(line: &str, reason: impl Into<String>) -> Self {
        Self {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    pub fn into_error(self, symbol: &str) -> Error {
        Error::MalformedAnnotation {
            symbol: symbol.to_string(),
            line: self.line,
            reason: self.reason,
        }
    }
}

/// Parse a documentation block into a [`HandlerInfo`].
///
/// Malformed values leave their field unset and are reported alongside the
/// result.
pub fn parse_annotations(doc: &str) -> (HandlerInfo, Vec<MalformedAnnotation>) {
    let mut info = HandlerInfo::default();
    let mut malformed = Vec::new();
    let mut description: Option<Vec<&str>> = None;
    let mut description_done = false;

    for raw_line in doc.lines() {
        let line = raw_line.trim();

        if !line.starts_with('@') {
            if let Some(lines) = description.as_mut() {
                lines.push(raw_line.trim_end());
            }
            continue;
        }

        // Any tag closes an open description block
        if let Some(lines) = description.take() {
            finish_description(&mut info, lines);
            description_done = true;
        }

        let (tag, value) = match line.split_once(char::is_whitespace) {
            Some((tag, value)) => (tag, value.trim()),
            None => (line, ""),
        };

        match tag {
            "@ID" => {
                if info.id.is_none() {
                    match value.split_whitespace().next() {
                        Some(token) => info.id = Some(token.to_string()),
                        None => malformed.push(MalformedAnnotation::new(line, "missing identifier")),
                    }
                }
            }
            "@Tag" => match value.split_whitespace().next() {
                Some(token) => {
                    info.tags.insert(token.to_string());
                }
                None => malformed.push(MalformedAnnotation::new(line, "missing tag name")),
            },
            "@Summary" => {
                if !value.is_empty() {
                    info.summary = Some(value.to_string());
                }
            }
            "@Description" => {
                if !description_done {
                    let mut lines = Vec::new();
                    if !value.is_empty() {
                        lines.push(value);
                    }
                    description = Some(lines);
                }
            }
            "@StatusCode" => match value.parse::<u16>() {
                Ok(code) if is_http_status(code) => info.status_code = Some(code),
                Ok(_) => malformed.push(MalformedAnnotation::new(line, "status code out of range")),
                Err(_) => malformed.push(MalformedAnnotation::new(line, "status code is not an integer")),
            },
            "@Deprecated" => info.deprecated = true,
            "@Error" => {
                let (code, message) = match value.split_once(char::is_whitespace) {
                    Some((code, message)) => (code, message.trim()),
                    None => (value, ""),
                };
                match code.parse::<u16>() {
                    Ok(code) if is_http_status(code) => info.errors.push((code, message.to_string())),
                    Ok(_) => malformed.push(MalformedAnnotation::new(line, "error code out of range")),
                    Err(_) => {
                        malformed.push(MalformedAnnotation::new(line, "error code is not an integer"))
                    }
                }
            }
            other => debug!("Ignoring unknown annotation {}", other),
        }
    }

    if let Some(lines) = description {
        finish_description(&mut info, lines);
    }

    (info, malformed)
}

fn finish_description(info: &mut HandlerInfo, lines: Vec<&str>) {
    let text = lines.join("\n");
    let text = text.trim();
    if !text.is_empty() {
        info.description = Some(text.to_string());
    }
}

/// Finds and parses the documentation of resolved handlers.
pub struct AnnotationParser<'a> {
    cache: &'a SourceCache,
    scanner: FileScanner,
    strict: bool,
}

/// What the annotation lookup found for one handler.
#[derive(Debug, Clone, Default)]
pub struct Annotated {
    pub info: HandlerInfo,
    /// The handler's declaration, if its source was located
    pub declaration: Option<FunctionDecl>,
}

impl<'a> AnnotationParser<'a> {
    /// `source_root` is the directory holding the crate root module.
    pub fn new(cache: &'a SourceCache, source_root: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            scanner: FileScanner::new(source_root.into()),
            strict: false,
        }
    }

    /// Treat malformed annotations as errors instead of warnings.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Locates the handler's declaration and parses its documentation.
    ///
    /// A handler without a documentation block, or whose source cannot be
    /// located, yields an empty [`HandlerInfo`].
    ///
    /// # Errors
    ///
    /// Fails when a unit of the handler's module cannot be parsed, or on a
    /// malformed annotation in strict mode.
    pub fn annotate(&self, identity: &ResolvedIdentity) -> Result<Annotated> {
        let Some(declaration) = self.locate(identity)? else {
            debug!("No declaration found for {}", identity.qualified_name);
            return Ok(Annotated::default());
        };

        let Some(doc) = declaration.doc.as_deref() else {
            return Ok(Annotated {
                info: HandlerInfo::default(),
                declaration: Some(declaration),
            });
        };

        let (info, malformed) = parse_annotations(doc);
        for problem in malformed {
            if self.strict {
                return Err(problem.into_error(&identity.symbol));
            }
            warn!(
                "Skipping malformed annotation on {}: `{}` ({})",
                identity.symbol, problem.line, problem.reason
            );
        }

        Ok(Annotated {
            info,
            declaration: Some(declaration),
        })
    }

    /// Loads the handler's module into the cache and finds its declaration.
    ///
    /// Only units of the handler's own module are searched, so the result
    /// does not depend on which modules earlier routes loaded.
    pub fn locate(&self, identity: &ResolvedIdentity) -> Result<Option<FunctionDecl>> {
        let receiver = identity.receiver.as_deref();
        let scan = self.scanner.package_units(&identity.module_segments());

        for path in &scan.rust_files {
            if !self.cache.contains_unit(path) {
                let unit = AstParser::parse_unit(path)?;
                self.cache.add(path.clone(), unit);
            }
            if let Some(found) = self
                .cache
                .unit(path)
                .and_then(|unit| unit.function(&identity.symbol, receiver).cloned())
            {
                debug!("Found {} in {}", identity.symbol, path.display());
                return Ok(Some(found));
            }
        }

        Ok(None)
    }
}
