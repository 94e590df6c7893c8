#![doc = include_str!("../README.md")]

//! Solver-agnostic real-arithmetic terms and the satisfiability interface
//! the verification engine is written against, with Z3 and cvc5 backends.

pub mod backends;
pub mod solver;
pub mod sorts;
pub mod terms;
