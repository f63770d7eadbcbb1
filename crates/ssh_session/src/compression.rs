//! Compression algorithms available for send/receive pipelines.
//!
//! Compression is an optimisation of the transport, never a requirement. Every
//! failure in [`negotiate`] degrades to the uncompressed base command and is
//! reported to the diagnostics collaborator as a warning.

use core::fmt;
use core::str::FromStr;

use logging::Diagnostics;

use crate::command::{CommandVector, PIPE};
use crate::probe::{CapabilityCheck, ProbeTarget};

/// Flag appended to an algorithm's binary to decompress.
const DECOMPRESS_FLAG: &str = "-d";

/// Compression programs a pipeline can be wrapped with.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CompressionAlgorithm {
    /// GNU gzip.
    Gzip,
    /// lzop, fast LZO compression.
    Lzop,
    /// bzip2.
    Bzip2,
    /// Parallel gzip.
    Pigz,
    /// xz / LZMA2.
    Xz,
}

impl CompressionAlgorithm {
    /// Every supported algorithm, in the order they are documented.
    pub const ALL: [Self; 5] = [Self::Gzip, Self::Lzop, Self::Bzip2, Self::Pigz, Self::Xz];

    /// Returns the canonical name used in configuration and diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Lzop => "lzop",
            Self::Bzip2 => "bzip2",
            Self::Pigz => "pigz",
            Self::Xz => "xz",
        }
    }

    /// Executable probed for on both ends of the connection.
    #[must_use]
    pub const fn binary(self) -> &'static str {
        self.name()
    }

    /// Tokens that compress stdin to stdout.
    #[must_use]
    pub fn compress_command(self) -> CommandVector {
        CommandVector::new(self.binary())
    }

    /// Tokens that decompress stdin to stdout.
    #[must_use]
    pub fn decompress_command(self) -> CommandVector {
        CommandVector::from_tokens([self.binary(), DECOMPRESS_FLAG])
    }

    /// Returns the set of supported algorithms.
    #[must_use]
    pub fn supported() -> &'static [Self] {
        &Self::ALL
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when attempting to parse an unsupported compression algorithm.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unsupported compression algorithm: {input}")]
pub struct CompressionParseError {
    input: String,
}

impl CompressionParseError {
    /// Creates a parse error capturing the original input.
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the invalid input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = CompressionParseError;

    /// Only the exact table names are accepted; `"GZIP"` and `" xz "` are not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| CompressionParseError::new(s))
    }
}

/// Why a requested algorithm was not enabled.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CompressionUnavailable {
    /// The name is not in the supported table.
    #[error("Compression method {requested} not supported. Will continue without...")]
    Unsupported {
        /// Name the caller asked for.
        requested: String,
    },
    /// The binary is missing on the local machine.
    #[error("Compression algo {algorithm} does not exist, continuing without compression...")]
    MissingLocally {
        /// Algorithm that was probed.
        algorithm: CompressionAlgorithm,
    },
    /// The binary is missing on the remote host.
    #[error(
        "Compression algo {algorithm} does not exist on {target}, continuing without compression..."
    )]
    MissingRemotely {
        /// Algorithm that was probed.
        algorithm: CompressionAlgorithm,
        /// `user@host` of the remote end.
        target: String,
    },
}

/// Result of [`negotiate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Negotiation {
    /// Algorithm in effect, if any.
    pub algorithm: Option<CompressionAlgorithm>,
    /// Command to splice into send/receive pipelines.
    pub pipeline: CommandVector,
    /// Reason compression was disabled after being requested.
    pub unavailable: Option<CompressionUnavailable>,
}

impl Negotiation {
    fn uncompressed(base: &CommandVector, unavailable: Option<CompressionUnavailable>) -> Self {
        Self {
            algorithm: None,
            pipeline: base.clone(),
            unavailable,
        }
    }
}

/// Wraps `base` with the compress and decompress stages of `algorithm`.
///
/// The result is `[bin, |] + base + [bin, -d, |]`, so the transport
/// invocation always appears unchanged inside the pipeline.
#[must_use]
pub fn pipeline_for(algorithm: CompressionAlgorithm, base: &CommandVector) -> CommandVector {
    let mut pipeline = algorithm.compress_command();
    pipeline.push(PIPE);
    pipeline.extend(base);
    pipeline.extend(&algorithm.decompress_command());
    pipeline.push(PIPE);
    pipeline
}

/// Chooses the compression stage for a session.
///
/// `requested` is the caller's algorithm name. The name is checked against
/// the supported table, then the binary is probed locally and finally on the
/// remote end through `base`. The first failing step disables compression.
pub fn negotiate(
    requested: Option<&str>,
    base: &CommandVector,
    target: &str,
    probe: &dyn CapabilityCheck,
    diagnostics: &dyn Diagnostics,
) -> Negotiation {
    let Some(requested) = requested else {
        return Negotiation::uncompressed(base, None);
    };

    let unavailable = match requested.parse::<CompressionAlgorithm>() {
        Err(_) => CompressionUnavailable::Unsupported {
            requested: requested.to_owned(),
        },
        Ok(algorithm) if !probe.exists(algorithm.binary(), ProbeTarget::Local) => {
            CompressionUnavailable::MissingLocally { algorithm }
        }
        Ok(algorithm) if !probe.exists(algorithm.binary(), ProbeTarget::Remote(base)) => {
            CompressionUnavailable::MissingRemotely {
                algorithm,
                target: target.to_owned(),
            }
        }
        Ok(algorithm) => {
            diagnostics.debug(
                "compression",
                &format!("using {algorithm} compression with {target}"),
            );
            return Negotiation {
                algorithm: Some(algorithm),
                pipeline: pipeline_for(algorithm, base),
                unavailable: None,
            };
        }
    };

    diagnostics.warn("compression", &unavailable.to_string());
    Negotiation::uncompressed(base, Some(unavailable))
}
