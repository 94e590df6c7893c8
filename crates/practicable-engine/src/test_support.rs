//! A solver that replays scripted verdicts and records every call.

use std::collections::{HashMap, VecDeque};
use std::io;

use practicable_smt::solver::{Model, ModelValue, SatResult, SmtSolver};
use practicable_smt::sorts::SmtSort;
use practicable_smt::terms::SmtTerm;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Reset,
    Declare(String, SmtSort),
    Assert(SmtTerm),
    Push,
    Pop,
    Check,
}

pub(crate) struct ScriptedSolver {
    verdicts: VecDeque<SatResult>,
    model: HashMap<String, ModelValue>,
    pub(crate) events: Vec<Event>,
}

impl ScriptedSolver {
    pub(crate) fn new(verdicts: Vec<SatResult>) -> Self {
        Self {
            verdicts: verdicts.into(),
            model: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub(crate) fn with_model_value(mut self, name: &str, value: ModelValue) -> Self {
        self.model.insert(name.to_string(), value);
        self
    }

    pub(crate) fn declared(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Declare(name, _) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn asserted(&self) -> Vec<&SmtTerm> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Assert(term) => Some(term),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn scope_balance(&self) -> i64 {
        self.events.iter().fold(0, |acc, e| match e {
            Event::Push => acc + 1,
            Event::Pop => acc - 1,
            _ => acc,
        })
    }
}

impl SmtSolver for ScriptedSolver {
    type Error = io::Error;

    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Self::Error> {
        self.events.push(Event::Declare(name.to_string(), *sort));
        Ok(())
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Self::Error> {
        self.events.push(Event::Assert(term.clone()));
        Ok(())
    }

    fn push(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::Push);
        Ok(())
    }

    fn pop(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::Pop);
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Self::Error> {
        self.events.push(Event::Check);
        Ok(self
            .verdicts
            .pop_front()
            .unwrap_or_else(|| SatResult::Unknown("script exhausted".into())))
    }

    fn check_sat_with_model(
        &mut self,
        var_names: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<Model>), Self::Error> {
        let result = self.check_sat()?;
        if result != SatResult::Sat {
            return Ok((result, None));
        }
        let values = var_names
            .iter()
            .filter_map(|(name, _)| {
                self.model
                    .get(*name)
                    .map(|v| (name.to_string(), v.clone()))
            })
            .collect();
        Ok((SatResult::Sat, Some(Model { values })))
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::Reset);
        Ok(())
    }
}
