use crate::error::{Error, Result};
use crate::status_scan::{infer_status, StatusInference};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use syn::{ImplItem, Item, Type};

/// AST (Abstract Syntax Tree) parser for Rust source files.
///
/// The `AstParser` uses the `syn` crate to parse a source file and lowers the
/// resulting tree into a [`SourceUnit`]: the list of function declarations
/// with their documentation and inferred status codes. `syn` trees are not
/// thread-safe, so only the lowered form is shared between route builds.
///
/// # Example
///
/// ```no_run
/// use openapi_from_handlers::parser::AstParser;
/// use std::path::Path;
///
/// let unit = AstParser::parse_unit(Path::new("src/handlers/users.rs")).unwrap();
/// println!("Declares {} functions", unit.functions.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

/// Thread-safe summary of one parsed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Path of the file the unit was parsed from
    pub path: PathBuf,
    /// Top-level functions and methods of top-level `impl` blocks, in source order
    pub functions: Vec<FunctionDecl>,
}

/// A function or method declaration found in a source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    /// Bare function name, without receiver or generics
    pub name: String,
    /// Self type of the enclosing `impl` block, for methods
    pub receiver: Option<String>,
    /// Raw documentation block, doc lines joined by newlines
    pub doc: Option<String>,
    /// Status code inferred from the body
    pub status: StatusInference,
}

impl AstParser {
    /// Parses a single Rust source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] naming the file if it cannot be read or
    /// contains invalid Rust syntax.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| Error::Parse {
            file: path.to_path_buf(),
            message: format!("failed to read file: {}", e),
        })?;
        Self::parse_source(path, &content)
    }

    /// Parses in-memory source text attributed to `path`.
    pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(content).map_err(|e| Error::Parse {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Parses a file and lowers it into a [`SourceUnit`].
    pub fn parse_unit(path: &Path) -> Result<SourceUnit> {
        let parsed = Self::parse_file(path)?;
        Ok(SourceUnit::from_parsed(&parsed))
    }
}

impl SourceUnit {
    /// Lowers a parsed file, indexing top-level functions and `impl` methods.
    pub fn from_parsed(parsed: &ParsedFile) -> Self {
        let mut functions = Vec::new();

        for item in &parsed.syntax_tree.items {
            match item {
                Item::Fn(item_fn) => functions.push(FunctionDecl {
                    name: bare_name(&item_fn.sig.ident),
                    receiver: None,
                    doc: extract_doc_comment(&item_fn.attrs),
                    status: infer_status(&item_fn.block),
                }),
                Item::Impl(item_impl) => {
                    let receiver = self_type_name(&item_impl.self_ty);
                    for impl_item in &item_impl.items {
                        if let ImplItem::Fn(method) = impl_item {
                            functions.push(FunctionDecl {
                                name: bare_name(&method.sig.ident),
                                receiver: receiver.clone(),
                                doc: extract_doc_comment(&method.attrs),
                                status: infer_status(&method.block),
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        debug!(
            "Indexed {} functions in {}",
            functions.len(),
            parsed.path.display()
        );

        Self {
            path: parsed.path.clone(),
            functions,
        }
    }

    /// Finds a declaration by bare name, preferring the given receiver.
    pub fn function(&self, name: &str, receiver: Option<&str>) -> Option<&FunctionDecl> {
        let mut candidates = self.functions.iter().filter(|f| f.name == name);
        match receiver {
            Some(receiver) => {
                let candidates: Vec<&FunctionDecl> = candidates.collect();
                candidates
                    .iter()
                    .find(|f| f.receiver.as_deref() == Some(receiver))
                    .or_else(|| candidates.first())
                    .copied()
            }
            None => candidates.next(),
        }
    }
}

fn bare_name(ident: &syn::Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}

fn self_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| bare_name(&segment.ident)),
        Type::Reference(reference) => self_type_name(&reference.elem),
        Type::Paren(paren) => self_type_name(&paren.elem),
        Type::Group(group) => self_type_name(&group.elem),
        _ => None,
    }
}

/// Extract doc comments from attributes.
/// Returns the doc lines joined by newlines, or `None` without doc comments.
pub fn extract_doc_comment(attrs: &[syn::Attribute]) -> Option<String> {
    let mut doc_lines = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("doc") {
            if let syn::Meta::NameValue(meta_nv) = &attr.meta {
                if let syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(lit_str),
                    ..
                }) = &meta_nv.value
                {
                    let line = lit_str.value();
                    // rustdoc keeps the space after `///`
                    let trimmed = line.strip_prefix(' ').unwrap_or(&line);
                    doc_lines.push(trimmed.to_string());
                }
            }
        }
    }

    if doc_lines.is_empty() {
        None
    } else {
        Some(doc_lines.join("\n"))
    }
}
