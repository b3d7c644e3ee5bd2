//! Weighted-CNF formulas and the WCNF text format.
//!
//! The format is line-oriented: a directive `p wcnf <vars> <clauses> <top>`
//! followed by one clause per line, each an integer weight, signed literals,
//! and a terminating `0`. A clause whose weight reaches `<top>` (the hard
//! weight threshold) is *hard*; everything below is soft.
//!
//! Declared-versus-actual count mismatches are tolerated with a warning.
//! Out-of-range variable ids and malformed tokens abort parsing.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt;
use std::io::{self, BufRead, Write};

use log::warn;

use crate::assignment::Assignment;
use crate::graph::Graph;
use crate::types::{Lit, Var, Weight};

/// A weighted clause: a disjunction of literals.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Clause {
    pub weight: Weight,
    pub literals: Vec<Lit>,
}

impl Clause {
    pub fn new(weight: Weight, literals: Vec<Lit>) -> Self {
        Clause { weight, literals }
    }

    pub fn variables(&self) -> impl Iterator<Item = Var> + '_ {
        self.literals.iter().map(|l| l.var())
    }

    /// True iff every variable of the clause is contained in `bag`.
    pub fn induced_by(&self, bag: &BTreeSet<Var>) -> bool {
        self.variables().all(|v| bag.contains(&v))
    }

    /// True iff some literal is assigned its satisfying value.
    pub fn satisfied(&self, assignment: &Assignment) -> bool {
        self.literals
            .iter()
            .any(|l| assignment.value(l.var()) == Some(l.is_positive()))
    }

    /// True iff every literal is assigned and none is satisfied.
    pub fn falsified(&self, assignment: &Assignment) -> bool {
        self.literals
            .iter()
            .all(|l| assignment.value(l.var()) == Some(!l.is_positive()))
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literals: Vec<String> = self.literals.iter().map(Lit::to_string).collect();
        write!(f, "({})", literals.join(" | "))
    }
}

/// Errors aborting WCNF parsing. Count mismatches are *not* errors; they are
/// reported through `log::warn!` and parsing continues.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ParseError {
    /// The `p wcnf ...` directive is malformed.
    BadDirective { line: usize },
    /// A clause appeared before the directive.
    MissingDirective { line: usize },
    /// A token could not be parsed as an integer.
    BadToken { line: usize, token: String },
    /// A clause line did not end with the terminating `0`.
    MissingTerminator { line: usize },
    /// A clause weight was zero or exceeded the hard-weight threshold.
    InvalidWeight { line: usize, weight: Weight },
    /// A literal referenced a variable outside `1..=num_vars`.
    VariableOutOfRange { line: usize, var: u32, num_vars: u32 },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadDirective { line } => {
                write!(f, "line {}: malformed 'p wcnf' directive", line)
            }
            ParseError::MissingDirective { line } => {
                write!(f, "line {}: clause before 'p wcnf' directive", line)
            }
            ParseError::BadToken { line, token } => {
                write!(f, "line {}: cannot parse token {:?}", line, token)
            }
            ParseError::MissingTerminator { line } => {
                write!(f, "line {}: clause does not end with 0", line)
            }
            ParseError::InvalidWeight { line, weight } => {
                write!(f, "line {}: invalid clause weight {}", line, weight)
            }
            ParseError::VariableOutOfRange { line, var, num_vars } => {
                write!(f, "line {}: variable {} out of range 1..={}", line, var, num_vars)
            }
        }
    }
}

impl Error for ParseError {}

/// A weighted MaxSAT formula in memory.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Formula {
    pub num_vars: u32,
    pub hard_weight: Weight,
    pub clauses: Vec<Clause>,
}

impl Formula {
    /// Parses the WCNF text format.
    pub fn parse(reader: impl BufRead) -> Result<Formula, Box<dyn Error>> {
        let mut formula: Option<Formula> = None;
        let mut declared_clauses = 0usize;
        let mut seen_vars: BTreeSet<Var> = BTreeSet::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = i + 1;
            let fields: Vec<&str> = line.split_whitespace().collect();

            if fields.is_empty() || fields[0] == "c" {
                continue;
            }

            if fields[0] == "p" {
                if fields.len() != 5 || fields[1] != "wcnf" {
                    return Err(ParseError::BadDirective { line: lineno }.into());
                }
                let num_vars = parse_token(fields[2], lineno)?;
                declared_clauses = parse_token(fields[3], lineno)?;
                let hard_weight = parse_token(fields[4], lineno)?;
                formula = Some(Formula {
                    num_vars,
                    hard_weight,
                    clauses: Vec::new(),
                });
                continue;
            }

            let formula = formula
                .as_mut()
                .ok_or(ParseError::MissingDirective { line: lineno })?;
            if fields.last() != Some(&"0") {
                return Err(ParseError::MissingTerminator { line: lineno }.into());
            }

            let weight: Weight = parse_token(fields[0], lineno)?;
            if weight == 0 || weight > formula.hard_weight {
                return Err(ParseError::InvalidWeight { line: lineno, weight }.into());
            }

            let mut literals: Vec<Lit> = Vec::new();
            for token in &fields[1..fields.len() - 1] {
                let value: i32 = parse_token(token, lineno)?;
                if value == 0 {
                    return Err(ParseError::BadToken { line: lineno, token: token.to_string() }.into());
                }
                let var = value.unsigned_abs();
                if var > formula.num_vars {
                    return Err(ParseError::VariableOutOfRange {
                        line: lineno,
                        var,
                        num_vars: formula.num_vars,
                    }
                    .into());
                }
                let lit = Lit::from_dimacs(value);
                // Duplicate literals within a clause carry no information.
                if !literals.contains(&lit) {
                    literals.push(lit);
                }
            }
            seen_vars.extend(literals.iter().map(|l| l.var()));
            formula.clauses.push(Clause::new(weight, literals));
        }

        let formula = formula.ok_or(ParseError::MissingDirective { line: 0 })?;
        if declared_clauses != formula.clauses.len() {
            warn!(
                "read {} clauses, but {} were declared",
                formula.clauses.len(),
                declared_clauses
            );
        }
        if seen_vars.len() != formula.num_vars as usize {
            warn!(
                "saw {} distinct variables, but {} were declared",
                seen_vars.len(),
                formula.num_vars
            );
        }
        Ok(formula)
    }

    /// Builds the primal interaction graph: one vertex per variable, one
    /// edge between any two variables co-occurring in a clause.
    pub fn primal_graph(&self) -> Graph {
        let mut graph = Graph::new(self.num_vars);
        for clause in &self.clauses {
            let vars: Vec<Var> = clause.variables().collect();
            for (i, &x) in vars.iter().enumerate() {
                for &y in &vars[i + 1..] {
                    if x != y {
                        graph.add_edge(x, y);
                    }
                }
            }
        }
        graph
    }

    /// Returns the indices of the clauses whose variables are wholly
    /// contained in `bag`.
    pub fn induced_clauses(&self, bag: &BTreeSet<Var>) -> Vec<usize> {
        self.clauses
            .iter()
            .enumerate()
            .filter(|(_, c)| c.induced_by(bag))
            .map(|(i, _)| i)
            .collect()
    }

    /// True iff the clause at `index` is hard (weight at the threshold).
    pub fn is_hard(&self, index: usize) -> bool {
        self.clauses[index].weight >= self.hard_weight
    }

    /// Renumbers variables to `1..=n` without gaps, preserving their order.
    pub fn remove_variable_gaps(&mut self) {
        let used: BTreeSet<Var> = self
            .clauses
            .iter()
            .flat_map(|c| c.variables().collect::<Vec<_>>())
            .collect();
        let renumber: BTreeMap<Var, Var> = used
            .iter()
            .enumerate()
            .map(|(position, &v)| (v, Var::new(position as u32 + 1)))
            .collect();
        for clause in &mut self.clauses {
            for lit in &mut clause.literals {
                *lit = Lit::new(renumber[&lit.var()], lit.is_positive());
            }
        }
        self.num_vars = used.len() as u32;
    }

    /// Serializes back to the WCNF text format, token-for-token compatible
    /// with the input format.
    pub fn write_wcnf(&self, mut writer: impl Write) -> io::Result<()> {
        writeln!(
            writer,
            "p wcnf {} {} {}",
            self.num_vars,
            self.clauses.len(),
            self.hard_weight
        )?;
        for clause in &self.clauses {
            write!(writer, "{}", clause.weight)?;
            for lit in &clause.literals {
                write!(writer, " {}", lit.to_dimacs())?;
            }
            writeln!(writer, " 0")?;
        }
        Ok(())
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self.clauses.iter().map(Clause::to_string).collect();
        write!(f, "{}", clauses.join(" & "))
    }
}

fn parse_token<T: std::str::FromStr>(token: &str, line: usize) -> Result<T, ParseError> {
    token.parse().map_err(|_| ParseError::BadToken {
        line,
        token: token.to_string(),
    })
}
