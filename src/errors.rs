use thiserror::Error;

/// Error taxonomy for the engine and its process-level surface.
///
/// `InputStructural` and `NumericCollapse` originate inside the HMM engine
/// and abort the chromosome that raised them; `UsageError` and `IOError`
/// originate at the CLI boundary. Modeled on the teacher crate's
/// `#[derive(Error, Debug)] pub enum Error` shape.
#[derive(Error, Debug)]
pub enum Error {
    #[error("site at column {column} has zero covering paths")]
    NoCoveringPaths { column: usize },
    #[error("site at column {column}: positions are not strictly increasing (prev={prev_pos}, cur={cur_pos})")]
    NonMonotonicPosition {
        column: usize,
        prev_pos: u64,
        cur_pos: u64,
    },
    #[error("site at column {column}: k-mer allele_mask references allele {allele} not present at the site")]
    UnknownAlleleInMask { column: usize, allele: u8 },
    #[error("column index {cell} out of range for column of size {size}")]
    CellIndexOutOfRange { cell: usize, size: usize },

    #[error("column {column} failed to normalise: divisor is zero or non-finite")]
    NormalisationCollapse { column: usize },
    #[error("column {column}: numeric accumulator overflowed after normalisation")]
    AccumulatorOverflow { column: usize },

    #[error("missing required argument: {name}")]
    MissingArgument { name: &'static str },
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// True for the kinds that abort a chromosome but let the orchestrator
    /// continue with the remaining ones (spec §7).
    pub fn aborts_chromosome(&self) -> bool {
        matches!(
            self,
            Error::NoCoveringPaths { .. }
                | Error::NonMonotonicPosition { .. }
                | Error::UnknownAlleleInMask { .. }
                | Error::CellIndexOutOfRange { .. }
                | Error::NormalisationCollapse { .. }
                | Error::AccumulatorOverflow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
