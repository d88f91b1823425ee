/// Process-wide tunables for the induction engine.
///
/// Mirrors `tsz_common::checker_options::CheckerOptions` in spirit: a small
/// `Copy` struct threaded through the engine rather than a pile of free
/// functions with default arguments.
#[derive(Clone, Copy, Debug)]
pub struct InductionOptions {
    /// Bytes of stack headroom below which [`grow_stack_for_recursion`]
    /// allocates a new stack segment before recursing further into a type
    /// graph. Pathological but acyclic graphs (§8 property 3) must still
    /// terminate without overflowing the stack.
    pub stack_red_zone: usize,
    /// Size of the stack segment allocated once the red zone is breached.
    pub stack_segment_size: usize,
}

impl Default for InductionOptions {
    fn default() -> Self {
        // Same constants `tsz-solver`/`tsz-checker` use for their own
        // `stacker` guard around deep type-graph recursion.
        Self {
            stack_red_zone: 32 * 1024,
            stack_segment_size: 1024 * 1024,
        }
    }
}

/// Grow the stack before recursing if we're within `options.stack_red_zone`
/// of the end of the current segment, then run `f`.
pub fn grow_stack_for_recursion<R>(options: InductionOptions, f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(options.stack_red_zone, options.stack_segment_size, f)
}
