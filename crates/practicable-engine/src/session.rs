//! Per-query solver sessions.
//!
//! A session resets its solver, asserts one model's declarations and domain
//! constraints, and runs each query inside a push/pop scope. Nothing a query
//! asserts survives the scope, and nothing survives the session.

use practicable_model::ModelEncoding;
use practicable_smt::solver::SmtSolver;
use practicable_smt::sorts::SmtSort;
use tracing::debug;

pub struct Session<'a, S: SmtSolver> {
    solver: &'a mut S,
    declarations: Vec<(String, SmtSort)>,
    depth: usize,
}

impl<'a, S: SmtSolver> Session<'a, S> {
    /// Reset `solver` and load `base` into it.
    pub fn open(solver: &'a mut S, base: &ModelEncoding) -> Result<Self, S::Error> {
        solver.reset()?;
        for (name, sort) in &base.declarations {
            solver.declare_var(name, sort)?;
        }
        for assertion in &base.assertions {
            solver.assert(assertion)?;
        }
        debug!(
            declarations = base.declarations.len(),
            assertions = base.assertions.len(),
            "opened solver session"
        );
        Ok(Self {
            solver,
            declarations: base.declarations.clone(),
            depth: 0,
        })
    }

    /// Declarations asserted when the session was opened.
    pub fn base_declarations(&self) -> &[(String, SmtSort)] {
        &self.declarations
    }

    /// Run `f` inside a fresh scope and pop it afterwards, even when `f` fails.
    pub fn scoped<R>(
        &mut self,
        f: impl FnOnce(&mut S) -> Result<R, S::Error>,
    ) -> Result<R, S::Error> {
        self.solver.push()?;
        self.depth += 1;
        let result = f(&mut *self.solver);
        let popped = self.solver.pop();
        self.depth -= 1;
        let value = result?;
        popped?;
        Ok(value)
    }

    /// Number of scopes currently open; zero between queries.
    pub fn depth(&self) -> usize {
        self.depth
    }
}
