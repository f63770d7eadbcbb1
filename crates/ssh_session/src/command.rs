//! Ordered argument vectors for external programs.
//!
//! Commands are kept as token sequences from construction until the moment a
//! caller needs a shell string. [`CommandVector::render_shell`] is that single
//! boundary: it escapes every token except the `|` pipeline operator.

use std::borrow::Cow;
use std::fmt;

/// Token that joins pipeline stages when a vector is rendered for a shell.
pub const PIPE: &str = "|";

/// Ordered sequence of argument tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CommandVector {
    tokens: Vec<String>,
}

impl CommandVector {
    /// Creates a vector whose first token is `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            tokens: vec![program.into()],
        }
    }

    /// Creates a vector from existing tokens.
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends one token.
    pub fn push(&mut self, token: impl Into<String>) -> &mut Self {
        self.tokens.push(token.into());
        self
    }

    /// Appends every token yielded by `tokens`.
    pub fn extend<I, S>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Returns a new vector made of `self` followed by `tokens`.
    ///
    /// The receiver is left untouched, which is how one-shot remote commands
    /// are derived from a session's base command.
    #[must_use]
    pub fn with_args<I, S>(&self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut extended = self.clone();
        extended.extend(tokens);
        extended
    }

    /// Returns the program token, if any.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Returns the tokens as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// Returns an iterator over the tokens.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.tokens.iter()
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Reports whether the vector holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Reports whether `prefix` matches the leading tokens of `self`.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.tokens.starts_with(&prefix.tokens)
    }

    /// Reports whether `inner` appears as a contiguous run inside `self`.
    #[must_use]
    pub fn contains_sequence(&self, inner: &Self) -> bool {
        inner.is_empty()
            || self
                .tokens
                .windows(inner.len())
                .any(|window| window == inner.as_slice())
    }

    /// Consumes the vector and returns the tokens.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.tokens
    }

    /// Renders the tokens into a POSIX shell command line.
    ///
    /// `|` tokens stay bare so they act as pipeline operators. Everything else
    /// is escaped, so a token containing spaces or quotes reaches the program
    /// as one argument.
    #[must_use]
    pub fn render_shell(&self) -> String {
        self.tokens
            .iter()
            .map(|token| {
                if token == PIPE {
                    Cow::Borrowed(PIPE)
                } else {
                    shell_escape::unix::escape(Cow::Borrowed(token.as_str()))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

impl<'a> IntoIterator for &'a CommandVector {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl From<Vec<String>> for CommandVector {
    fn from(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

impl AsRef<[String]> for CommandVector {
    fn as_ref(&self) -> &[String] {
        &self.tokens
    }
}
