//! Exact solving of systems of linear equations.
//!
//! Every coefficient is a [`Fraction`], so there is no rounding error
//! anywhere between the equations going in and the answer coming out.
//!
//! ```rust
//! use exact_solve::{EquationSystem, Fraction};
//!
//! let system = EquationSystem::from_equations(&[
//!     "x + 2y + 4z = 3",
//!     "3x - y + 3z = 4",
//!     "5x + 2y + 4z = 18",
//! ])?;
//!
//! let solution = system.solve()?;
//!
//! assert_eq!(solution["x"], Fraction::new(15, 4));
//! assert_eq!(solution["z"].to_string(), "-61/40");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod equations;
mod fraction;
mod parse;
#[cfg(test)]
mod proptests;
mod solve;

pub use equations::{
    Equation, EquationBuilder, EquationSystem, MismatchedVariables,
};
pub use fraction::{ArithmeticError, Fraction, ParseFractionError};
pub use parse::{parse_equation, ParseError, TokenKind};
pub use solve::{FreeVariables, Solution, SolveError, SolveOptions};
