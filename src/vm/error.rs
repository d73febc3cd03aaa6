/// Fatal errors surfaced by either execution mode.
///
/// No error is retried; each one halts the interpreter that detected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// An index proven out of range (1-based index, known element count).
    IndexOutOfBounds { index: i64, len: i64 },
    /// `c()` with no arguments; arrays cannot be empty by construction.
    EmptyArray,
    /// An abstract value reached a concrete register write. Signals a
    /// defect in the compiled program, not a runtime condition.
    NotConcrete(String),
    /// A call names neither a builtin nor a defined function.
    UnknownBuiltin(String),
    /// Concrete control flow needs exactly one successor but the guard
    /// could not be decided.
    MultipleTargets { pc: usize },
    /// The instruction array violates a structural invariant.
    Miscompilation(String),
    /// The concrete interpreter exceeded its step budget.
    StepLimitExceeded { limit: usize },
    /// The analyzer exceeded its sweep budget.
    SweepLimitExceeded { limit: usize },
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfBounds { index, len } => {
                write!(
                    f,
                    "index {} out of bounds for vector of length {}",
                    index, len
                )
            }
            Self::EmptyArray => write!(f, "arrays can't be zero length"),
            Self::NotConcrete(value) => {
                write!(f, "abstract value {} in a concrete register write", value)
            }
            Self::UnknownBuiltin(name) => {
                write!(f, "unknown builtin or undefined function `{}`", name)
            }
            Self::MultipleTargets { pc } => {
                write!(f, "undecidable branch at pc {} in concrete execution", pc)
            }
            Self::Miscompilation(msg) => write!(f, "miscompilation: {}", msg),
            Self::StepLimitExceeded { limit } => {
                write!(f, "step budget of {} exceeded", limit)
            }
            Self::SweepLimitExceeded { limit } => {
                write!(f, "sweep budget of {} exceeded", limit)
            }
        }
    }
}

impl std::error::Error for VmError {}
