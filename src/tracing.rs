//! Tracing streamlines of a vector field.

pub mod parallel;
pub mod sampling;
pub mod seeding;
pub mod stepping;
pub mod streamline;

/// Floating-point precision to use for tracing.
#[allow(non_camel_case_types)]
pub type ftr = f64;

/// Whether to print informational messages while tracing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verbose {
    Yes,
    No,
}

impl Verbose {
    /// Whether verbosity is enabled.
    pub fn is_yes(self) -> bool {
        self == Verbose::Yes
    }
}
