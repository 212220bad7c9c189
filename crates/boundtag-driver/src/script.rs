//! Script parsing.
//!
//! A script starts with the number of test cases, followed by a blank
//! line. Each case is one integer per line and ends at a blank line or at
//! the end of input. Declared cases missing from the input replay as
//! empty cases.

use std::error::Error;
use std::fmt;

/// One line of a test case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// Allocate this many elements.
    Allocate(usize),
    /// Free the in-use block with this 0-based index in address order.
    Deallocate(usize),
}

impl Request {
    /// Decode a script value: `k > 0` allocates `k` elements, `-k` frees the
    /// `k`-th in-use block, and zero is a no-op.
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => None,
            v if v > 0 => Some(Self::Allocate(usize::try_from(v).unwrap_or(usize::MAX))),
            v => {
                let nth = usize::try_from(v.unsigned_abs()).unwrap_or(usize::MAX);
                Some(Self::Deallocate(nth - 1))
            }
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocate(count) => write!(f, "{count}"),
            Self::Deallocate(index) => write!(f, "-{}", index + 1),
        }
    }
}

/// A parsed script: a declared case count and the cases present in the input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    declared: usize,
    cases: Vec<Vec<Request>>,
}

impl Script {
    /// Build a script from explicit cases.
    pub fn new(cases: Vec<Vec<Request>>) -> Self {
        Self {
            declared: cases.len(),
            cases,
        }
    }

    /// Parse the text format described in the module docs.
    pub fn parse(input: &str) -> Result<Self, ScriptError> {
        let mut lines = input
            .lines()
            .enumerate()
            .map(|(i, text)| (i + 1, text.trim()))
            .peekable();

        let (line, text) = lines
            .by_ref()
            .find(|(_, text)| !text.is_empty())
            .ok_or(ScriptError::MissingCaseCount)?;
        let declared = parse_number::<usize>(line, text)?;

        // Blank separator between the count and the first case.
        lines.next_if(|(_, text)| text.is_empty());

        let mut cases = Vec::new();
        while cases.len() < declared && lines.peek().is_some() {
            let mut requests = Vec::new();
            for (line, text) in lines.by_ref() {
                if text.is_empty() {
                    break;
                }
                if let Some(request) = Request::from_value(parse_number(line, text)?) {
                    requests.push(request);
                }
            }
            cases.push(requests);
        }

        Ok(Self { declared, cases })
    }

    /// Number of test cases the script declares.
    pub fn declared(&self) -> usize {
        self.declared
    }

    /// Every declared case in order; cases absent from the input are empty.
    pub fn cases(&self) -> impl Iterator<Item = &[Request]> + '_ {
        (0..self.declared).map(move |i| self.cases.get(i).map_or(&[][..], Vec::as_slice))
    }
}

/// Parse the first whitespace-separated token of a line.
fn parse_number<N: std::str::FromStr>(line: usize, text: &str) -> Result<N, ScriptError> {
    text.split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| ScriptError::InvalidNumber {
            line,
            text: text.to_string(),
        })
}

/// Errors from [`Script::parse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptError {
    /// The input has no case count line.
    MissingCaseCount,
    /// A line does not start with an integer.
    InvalidNumber {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCaseCount => write!(f, "script is empty: expected a test case count"),
            Self::InvalidNumber { line, text } => {
                write!(f, "line {line}: expected an integer, got '{text}'")
            }
        }
    }
}

impl Error for ScriptError {}
