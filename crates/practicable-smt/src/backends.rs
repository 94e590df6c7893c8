//! Concrete solver backends and the SMT-LIB2 text layer they share.

pub mod cvc5_backend;
pub mod smtlib_printer;
pub mod z3_backend;
