use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PindefsError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("XML parse error at line {line}: {message}")]
    XmlError { line: usize, message: String },
    #[error("Netlist error: {0}")]
    NetlistError(String),
    #[error("Snippet error: {0}")]
    SnippetError(String),
    #[error("Header parse error at line {line}: {message}")]
    HeaderError { line: usize, message: String },
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Conflicting definition for {logical}: {existing} vs {proposed}")]
    ConflictingDefinition {
        logical: String,
        existing: String,
        proposed: String,
    },
    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
