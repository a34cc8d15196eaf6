// =============================================================================
// Signals Module
// =============================================================================
//
// Turns an indicator frame into a discrete directional signal. The detector
// is a pure function of the two most recent rows; it carries no state across
// cycles, so a crossover is re-derived from scratch on every scan.

pub mod crossover;

pub use crossover::detect;
