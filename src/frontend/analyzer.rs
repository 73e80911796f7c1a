//! SourceAnalyzer: structural recognition of a Fortran test file
//!
//! This is a restricted pattern matcher over scanned statements, not a Fortran parser. It recognizes:
//!
//! - the program unit (`module name` or `program name`); the first one in the file is the primary unit
//! - `use` statements in all their spellings (`use m`, `use :: m`, `use, intrinsic :: m`, `use m, only: ...`)
//! - procedure headers with prefixes (`pure`, `elemental`, `recursive`, typed `function`s, ...)
//! - `interface` blocks, whose bodies are declarations and never candidates
//! - `end`, `end subroutine`, fused `endsubroutine`, `end module`, ...
//!
//! A procedure stack tracks nesting so only top-level subroutines of the primary unit become test candidates.
//! Anything outside this subset is ignored. The documented failure modes are the [`AnalysisError`] variants.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use fortest_core::lang::conventions;
use fortest_core::lang::keywords::{self, KeywordCategory, KeywordId};

use super::diagnostics::AnalysisError;
use super::scanner::{self, Statement, Token};

/// Kind of the primary program unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Module,
    Program,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Module => "module",
            UnitKind::Program => "program",
        }
    }
}

/// The declared module or program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramUnit {
    pub kind: UnitKind,
    pub name: String,
    pub line: usize,
}

/// One `use`d module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseDecl {
    pub name: String,
    /// Compiler-provided module (`iso_fortran_env`, or explicitly `use, intrinsic ::`).
    pub intrinsic: bool,
}

/// A candidate test subroutine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubroutineDecl {
    pub name: String,
    pub line: usize,
    /// Position among the file's candidates (declaration order = call order).
    pub ordinal: usize,
}

/// Everything the pipeline needs to know about one test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAnalysis {
    pub unit: ProgramUnit,
    /// Used modules, deduplicated in first-use order.
    pub uses: Vec<UseDecl>,
    /// Candidate test subroutines in declaration order.
    pub subroutines: Vec<SubroutineDecl>,
    /// Every module this file declares itself (the primary unit included).
    pub declared_modules: Vec<String>,
}

impl SourceAnalysis {
    /// Used modules that are neither intrinsic nor declared in this file.
    pub fn external_uses(&self) -> impl Iterator<Item = &str> {
        self.uses
            .iter()
            .filter(|u| !u.intrinsic && !self.declared_modules.contains(&u.name))
            .map(|u| u.name.as_str())
    }
}

/// Recognized statement shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Recognized {
    Unit { keyword: KeywordId, name: String },
    ProcedureStart { keyword: KeywordId, name: String },
    InterfaceStart,
    End { closes: EndTarget, text: String },
    Use(UseDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndTarget {
    Bare,
    Keyword(KeywordId),
    /// `end do`, `end if`, `end type`, ... (not tracked)
    Other,
}

#[derive(Debug)]
enum Frame {
    Unit { primary: bool },
    Procedure { keyword: KeywordId, name: String, line: usize },
    Interface { line: usize },
}

/// Analyze source text.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn analyze_source(source: &str) -> Result<SourceAnalysis, AnalysisError> {
    Analyzer::default().run(&scanner::scan(source))
}

/// Read and analyze a file.
pub fn analyze_file(path: &Path) -> Result<(String, SourceAnalysis), AnalysisError> {
    let source = fs::read_to_string(path).map_err(|e| AnalysisError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let analysis = analyze_source(&source)?;
    Ok((source, analysis))
}

/// Names of all modules declared in `source` (a cheap scan used for module-source resolution).
pub fn declared_modules(source: &str) -> Vec<String> {
    scanner::scan(source)
        .iter()
        .filter_map(|stmt| match recognize(stmt) {
            Some(Recognized::Unit {
                keyword: KeywordId::Module,
                name,
            }) => Some(name),
            _ => None,
        })
        .collect()
}

#[derive(Default)]
struct Analyzer {
    stack: Vec<Frame>,
    unit: Option<ProgramUnit>,
    uses: Vec<UseDecl>,
    subroutines: Vec<SubroutineDecl>,
    declared_modules: Vec<String>,
    /// Top-level subroutine names of the primary unit → first declaration line.
    seen: HashMap<String, usize>,
}

impl Analyzer {
    fn run(mut self, statements: &[Statement]) -> Result<SourceAnalysis, AnalysisError> {
        for stmt in statements {
            if let Some(recognized) = recognize(stmt) {
                self.apply(recognized, stmt.line)?;
            }
        }

        let unit = self.unit.ok_or(AnalysisError::MissingUnit)?;

        if let Some(Frame::Procedure { keyword, name, line }) =
            self.stack.iter().rev().find(|f| matches!(f, Frame::Procedure { .. }))
        {
            return Err(AnalysisError::UnterminatedProcedure {
                kind: keywords::as_str(*keyword),
                name: name.clone(),
                line: *line,
            });
        }

        Ok(SourceAnalysis {
            unit,
            uses: self.uses,
            subroutines: self.subroutines,
            declared_modules: self.declared_modules,
        })
    }

    fn apply(&mut self, recognized: Recognized, line: usize) -> Result<(), AnalysisError> {
        match recognized {
            Recognized::Unit { keyword, name } => {
                if keyword == KeywordId::Module {
                    self.declared_modules.push(name.clone());
                }
                let kind = match keyword {
                    KeywordId::Module => Some(UnitKind::Module),
                    KeywordId::Program => Some(UnitKind::Program),
                    _ => None,
                };
                let primary = match kind {
                    Some(kind) if self.unit.is_none() && self.stack.is_empty() => {
                        self.unit = Some(ProgramUnit { kind, name, line });
                        true
                    }
                    _ => false,
                };
                self.stack.push(Frame::Unit { primary });
            }
            Recognized::ProcedureStart { keyword, name } => {
                let in_interface = matches!(self.stack.last(), Some(Frame::Interface { .. }));
                // `module procedure a, b` inside a generic interface is a list, not a body.
                if keyword == KeywordId::Procedure && in_interface {
                    return Ok(());
                }
                let top_level = matches!(self.stack.as_slice(), [Frame::Unit { primary: true }]);
                if top_level && keyword == KeywordId::Subroutine {
                    self.record_subroutine(&name, line)?;
                }
                self.stack.push(Frame::Procedure { keyword, name, line });
            }
            Recognized::InterfaceStart => self.stack.push(Frame::Interface { line }),
            Recognized::End { closes, text } => self.close(closes, text, line)?,
            Recognized::Use(decl) => {
                if !self.uses.iter().any(|u| u.name == decl.name) {
                    self.uses.push(decl);
                }
            }
        }
        Ok(())
    }

    fn record_subroutine(&mut self, name: &str, line: usize) -> Result<(), AnalysisError> {
        if let Some(&first) = self.seen.get(name) {
            return Err(AnalysisError::DuplicateSubroutine {
                name: name.to_string(),
                first,
                second: line,
            });
        }
        self.seen.insert(name.to_string(), line);

        if conventions::is_test_subroutine_name(name) {
            self.subroutines.push(SubroutineDecl {
                name: name.to_string(),
                line,
                ordinal: self.subroutines.len(),
            });
        }
        Ok(())
    }

    fn close(&mut self, closes: EndTarget, text: String, line: usize) -> Result<(), AnalysisError> {
        let unexpected = || AnalysisError::UnexpectedEnd {
            statement: text.clone(),
            line,
        };

        match closes {
            EndTarget::Other => Ok(()),
            EndTarget::Bare => match self.stack.last() {
                Some(Frame::Procedure { .. } | Frame::Unit { .. }) => {
                    self.stack.pop();
                    Ok(())
                }
                _ => Err(unexpected()),
            },
            EndTarget::Keyword(KeywordId::Subroutine | KeywordId::Function | KeywordId::Procedure) => {
                match self.stack.last() {
                    Some(Frame::Procedure { .. }) => {
                        self.stack.pop();
                        Ok(())
                    }
                    _ => Err(unexpected()),
                }
            }
            EndTarget::Keyword(KeywordId::Interface) => match self.stack.last() {
                Some(Frame::Interface { .. }) => {
                    self.stack.pop();
                    Ok(())
                }
                Some(Frame::Procedure { keyword, name, line }) => Err(AnalysisError::UnterminatedProcedure {
                    kind: keywords::as_str(*keyword),
                    name: name.clone(),
                    line: *line,
                }),
                _ => Err(unexpected()),
            },
            EndTarget::Keyword(KeywordId::Module | KeywordId::Program | KeywordId::Submodule) => {
                match self.stack.last() {
                    Some(Frame::Unit { .. }) => {
                        self.stack.pop();
                        Ok(())
                    }
                    Some(Frame::Procedure { keyword, name, line }) => Err(AnalysisError::UnterminatedProcedure {
                        kind: keywords::as_str(*keyword),
                        name: name.clone(),
                        line: *line,
                    }),
                    Some(Frame::Interface { line: opened }) => Err(AnalysisError::UnexpectedEnd {
                        statement: format!("{text} (interface opened on line {opened} is still open)"),
                        line,
                    }),
                    None => Err(unexpected()),
                }
            }
            EndTarget::Keyword(_) => Ok(()),
        }
    }
}

/// Recognize one statement, or `None` for anything the analyzer does not track.
fn recognize(stmt: &Statement) -> Option<Recognized> {
    let first = stmt.ident_at(0)?;

    // Assignments to variables that share a keyword spelling (`end = 3`).
    if matches!(stmt.tokens.get(1), Some(Token::Punct('=' | '%'))) {
        return None;
    }

    if first == "end" || keywords::split_fused_end(first).is_some() {
        return recognize_end(stmt);
    }

    match keywords::from_str(first) {
        Some(KeywordId::Use) => recognize_use(stmt).map(Recognized::Use),
        Some(KeywordId::Interface) => Some(Recognized::InterfaceStart),
        Some(KeywordId::Abstract) if stmt.ident_at(1) == Some("interface") => Some(Recognized::InterfaceStart),
        Some(KeywordId::Program) => Some(Recognized::Unit {
            keyword: KeywordId::Program,
            name: stmt.ident_at(1).unwrap_or("main").to_string(),
        }),
        Some(KeywordId::Submodule) => {
            let name = stmt.tokens.iter().rev().find_map(Token::ident)?;
            Some(Recognized::Unit {
                keyword: KeywordId::Submodule,
                name: name.to_string(),
            })
        }
        Some(KeywordId::Module) => match stmt.ident_at(1).and_then(keywords::from_str) {
            // `module procedure name` opens a separate module procedure body.
            Some(KeywordId::Procedure) => Some(Recognized::ProcedureStart {
                keyword: KeywordId::Procedure,
                name: stmt.ident_at(2)?.to_string(),
            }),
            Some(KeywordId::Subroutine | KeywordId::Function) => recognize_procedure(stmt),
            Some(id) if keywords::category(id) == KeywordCategory::ProcedurePrefix => recognize_procedure(stmt),
            _ if stmt.tokens.len() == 2 => Some(Recognized::Unit {
                keyword: KeywordId::Module,
                name: stmt.ident_at(1)?.to_string(),
            }),
            _ => None,
        },
        _ => recognize_procedure(stmt),
    }
}

fn recognize_end(stmt: &Statement) -> Option<Recognized> {
    let first = stmt.ident_at(0)?;
    let text = stmt
        .tokens
        .iter()
        .take(2)
        .filter_map(Token::ident)
        .collect::<Vec<_>>()
        .join(" ");

    let closes = if first == "end" {
        match stmt.tokens.get(1) {
            None => EndTarget::Bare,
            Some(Token::Ident(word)) => match keywords::from_str(word) {
                Some(id) => EndTarget::Keyword(id),
                None => EndTarget::Other,
            },
            Some(_) => return None,
        }
    } else {
        EndTarget::Keyword(keywords::split_fused_end(first)?)
    };

    Some(Recognized::End { closes, text })
}

fn recognize_use(stmt: &Statement) -> Option<UseDecl> {
    let mut tokens = stmt.tokens.iter().skip(1).peekable();
    let mut nature: Option<KeywordId> = None;

    if tokens.peek() == Some(&&Token::Punct(',')) {
        tokens.next();
        nature = tokens.next().and_then(Token::ident).and_then(keywords::from_str);
    }
    if tokens.peek() == Some(&&Token::DoubleColon) {
        tokens.next();
    }

    let name = tokens.next()?.ident()?.to_string();
    let intrinsic = match nature {
        Some(KeywordId::Intrinsic) => true,
        Some(KeywordId::NonIntrinsic) => false,
        _ => conventions::is_intrinsic_module(&name),
    };
    Some(UseDecl { name, intrinsic })
}

/// Type-spec words that may precede `function`.
const TYPE_SPECS: &[&str] = &[
    "integer",
    "real",
    "complex",
    "logical",
    "character",
    "double",
    "precision",
    "doubleprecision",
    "type",
    "class",
];

fn recognize_procedure(stmt: &Statement) -> Option<Recognized> {
    let mut i = 0;
    while i < stmt.tokens.len() {
        let word = stmt.ident_at(i)?;
        match keywords::from_str(word) {
            Some(keyword @ (KeywordId::Subroutine | KeywordId::Function)) => {
                let name = stmt.ident_at(i + 1)?;
                return Some(Recognized::ProcedureStart {
                    keyword,
                    name: name.to_string(),
                });
            }
            Some(KeywordId::Module) => i += 1,
            Some(id) if keywords::category(id) == KeywordCategory::ProcedurePrefix => i += 1,
            _ if TYPE_SPECS.contains(&word) => {
                i += 1;
                i = skip_kind_selector(&stmt.tokens, i);
            }
            _ => return None,
        }
    }
    None
}

/// Skip `(kind=8)` or `*8` after a type-spec word; returns the index after the selector.
fn skip_kind_selector(tokens: &[Token], mut i: usize) -> usize {
    match tokens.get(i) {
        Some(Token::Punct('(')) => {
            let mut depth = 0usize;
            while let Some(tok) = tokens.get(i) {
                match tok {
                    Token::Punct('(') => depth += 1,
                    Token::Punct(')') => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return i + 1;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            i
        }
        Some(Token::Punct('*')) => i + 2,
        _ => i,
    }
}
