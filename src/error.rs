use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every error is fatal to the in-progress decompilation attempt: nothing is retried internally
/// and no partial expression tree is ever produced. Callers that inline opportunistically are
/// expected to catch the error and fall back to the original, non-inlined expression.
///
/// # Error Categories
///
/// ## Decode-time errors
/// - [`Error::UnsupportedOperand`] - Opcode's declared operand kind has no decoding rule
/// - [`Error::OutOfBounds`] - Attempted to read beyond the method body
/// - [`Error::Malformed`] - Invalid or reserved opcode encoding
/// - [`Error::Empty`] - Empty method body provided
///
/// ## Pipeline-time errors
/// - [`Error::UnsupportedInstruction`] - No translator or structural step can interpret an instruction
/// - [`Error::BranchTargetNotFound`] - A conditional jump's target exists in no reachable sequence
/// - [`Error::BackwardBranchUnsupported`] - A branch target precedes its own instruction (a loop)
/// - [`Error::RecursionLimit`] - Maximum branch nesting depth exceeded
#[derive(Error, Debug)]
pub enum Error {
    /// The method body is damaged or uses an encoding this library does not model.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding the method body.
    ///
    /// This error occurs when an opcode declares more operand bytes than the
    /// buffer still holds. It's a safety check to prevent reads past the body.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    ///
    /// This error occurs when an empty method body is handed to the decompiler
    /// where actual CIL bytecode was expected.
    #[error("Provided input was empty")]
    Empty,

    /// The opcode's declared operand kind has no decoding rule.
    ///
    /// Raised at decode time for operand kinds this library deliberately does not
    /// decode (switch tables, standalone signatures, raw metadata tokens). The
    /// mnemonic names the offending opcode.
    #[error("Opcode '{mnemonic}' has an unsupported operand kind")]
    UnsupportedOperand {
        /// Mnemonic of the opcode whose operand could not be decoded
        mnemonic: &'static str,
    },

    /// No translator and no structural step can interpret an instruction.
    ///
    /// Raised at pipeline time, typically for `throw`, store instructions,
    /// exception-handling opcodes or fused comparison branches.
    #[error("No handler can interpret instruction '{mnemonic}'")]
    UnsupportedInstruction {
        /// Mnemonic of the instruction nothing could interpret
        mnemonic: String,
    },

    /// Branch resolution cannot locate a jump's target.
    ///
    /// The target offset exists neither in the current element sequence nor in
    /// any cut branch, meaning the input contains control flow this algorithm
    /// cannot structure.
    #[error("Branch target at offset {target} was not found in any reachable sequence")]
    BranchTargetNotFound {
        /// Absolute offset the jump pointed at
        target: i64,
    },

    /// A branch target precedes its own instruction.
    ///
    /// Backward branches are loops, and loop reconstruction is rejected by
    /// design rather than silently approximated.
    #[error("Backward branch from offset {offset} to {target} is not supported")]
    BackwardBranchUnsupported {
        /// Offset of the branching instruction
        offset: usize,
        /// Absolute offset the jump pointed at
        target: i64,
    },

    /// Recursion limit reached.
    ///
    /// Branch resolution recurses once per conditional nesting level;
    /// pathological input could otherwise drive unbounded call-stack growth.
    /// The associated value shows the limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}
