use crate::{Mark, TokenKind};

#[derive(Debug, thiserror::Error)]
pub enum FormatterError {
    #[error("{}:{}: {} (token {}: {})", mark.line, mark.column, problem, index, token)]
    Problem {
        problem: &'static str,
        /// Position of the offending token in the input stream.
        index: usize,
        /// Position in the output written so far.
        mark: Mark,
        token: TokenKind,
    },
    #[error(transparent)]
    Writer(#[from] WriterError),
}

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("writer could not flush the entire buffer")]
    Incomplete,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("invalid byte order mark")]
    InvalidBom,
    #[error("invalid UTF-8 byte {value:#04x} at offset {offset}")]
    InvalidUtf8 { value: u8, offset: usize },
    #[error("invalid UTF-16 unpaired surrogate {value:#06x} at offset {offset}")]
    InvalidUtf16 { value: u16, offset: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum TokenizerError {
    #[error("{}:{}: {} {} ({}:{})", problem_mark.line, problem_mark.column, problem, context, context_mark.line, context_mark.column)]
    Problem {
        context: &'static str,
        context_mark: Mark,
        problem: &'static str,
        problem_mark: Mark,
        /// The token being scanned, if one had formed.
        token: TokenKind,
    },
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

impl TokenizerError {
    /// Where the problem was detected, if the error came from scanning.
    pub fn mark(&self) -> Option<Mark> {
        match self {
            TokenizerError::Problem { problem_mark, .. } => Some(*problem_mark),
            TokenizerError::Reader(_) => None,
        }
    }
}

impl FormatterError {
    /// Index of the offending token, if the error came from formatting.
    pub fn index(&self) -> Option<usize> {
        match self {
            FormatterError::Problem { index, .. } => Some(*index),
            FormatterError::Writer(_) => None,
        }
    }
}
