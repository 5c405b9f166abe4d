//! Interpreter limits

/// Default operand stack bound, in cells
pub const DEFAULT_MAX_STACK_DEPTH: usize = 1 << 20;

/// Default bound on pending continuations
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1 << 16;

/// Resource limits for one run
///
/// # Example
///
/// ```
/// use interpreter::VmConfig;
///
/// let config = VmConfig::new()
///     .with_max_stack_depth(1024)
///     .with_instruction_budget(10_000);
/// assert_eq!(config.max_stack_depth, 1024);
/// assert_eq!(config.instruction_budget, Some(10_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of cells on the operand stack
    pub max_stack_depth: usize,
    /// Maximum number of nested calls
    pub max_call_depth: usize,
    /// Maximum number of instructions to execute, if limited
    pub instruction_budget: Option<u64>,
}

impl VmConfig {
    /// Default limits, no instruction budget
    pub fn new() -> Self {
        Self {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            instruction_budget: None,
        }
    }

    /// Set the operand stack bound
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    /// Set the call depth bound
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Abort runs after `budget` instructions
    pub fn with_instruction_budget(mut self, budget: u64) -> Self {
        self.instruction_budget = Some(budget);
        self
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self::new()
    }
}
