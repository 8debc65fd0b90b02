//! DIMACS output at the solver boundary.
//!
//! The core itself has no textual format; this module prints the live clause
//! database (and a set of assumptions, as unit clauses) so a state can be
//! handed to external tools. Clauses satisfied at the root are skipped and
//! root-false literals dropped; variables are renumbered densely.

use crate::callbacks::Callbacks;
use crate::clause::{lbool, Lit, VMap, Var};
use crate::core::Solver;
use crate::interface::SolverInterface;
use std::io::{self, Write};

fn map_var(x: Var, map: &mut VMap<i32>, max: &mut i32) -> i32 {
    map.reserve(x, -1);
    if map[x] == -1 {
        map[x] = *max;
        *max += 1;
    }
    map[x]
}

fn write_lit<W: Write>(out: &mut W, l: Lit, n: i32) -> io::Result<()> {
    write!(out, "{}{} ", if l.sign() { "" } else { "-" }, n + 1)
}

/// Write the non-satisfied part of the clause database in DIMACS format,
/// with `assumps` added as unit clauses.
pub fn write_dimacs<Cb: Callbacks, W: Write>(
    s: &Solver<Cb>,
    out: &mut W,
    assumps: &[Lit],
) -> io::Result<()> {
    // Handle case when solver is in contradictory state:
    if !s.is_ok() {
        return write!(out, "p cnf 1 2\n1 0\n-1 0\n");
    }

    let satisfied =
        |c: &[Lit]| c.iter().any(|&l| s.current_value_lit(l) == lbool::TRUE);

    let mut map: VMap<i32> = VMap::new();
    let mut max: i32 = 0;

    let mut cnt = assumps.len();
    for c in s.original_clauses() {
        if satisfied(c) {
            continue;
        }
        cnt += 1;
        for &l in c {
            if s.current_value_lit(l) != lbool::FALSE {
                map_var(l.var(), &mut map, &mut max);
            }
        }
    }
    for &a in assumps {
        map_var(a.var(), &mut map, &mut max);
    }

    writeln!(out, "p cnf {} {}", max, cnt)?;

    // Assumptions are added as unit clauses:
    for &a in assumps {
        debug_assert!(s.current_value_lit(a) != lbool::FALSE);
        write_lit(out, a, map_var(a.var(), &mut map, &mut max))?;
        writeln!(out, "0")?;
    }

    for c in s.original_clauses() {
        if satisfied(c) {
            continue;
        }
        for &l in c {
            if s.current_value_lit(l) != lbool::FALSE {
                write_lit(out, l, map_var(l.var(), &mut map, &mut max))?;
            }
        }
        writeln!(out, "0")?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{BasicSolver, EmptyHost, SolverInterface};

    fn lit(i: u32, sign: bool) -> Lit {
        Lit::new(Var::from_idx(i), sign)
    }

    #[test]
    fn test_write_plain_db() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        for _ in 0..3 {
            s.new_var_default(&mut h);
        }
        s.add_clause_reuse(&mut h, &mut vec![lit(0, true), lit(1, false)]);
        s.add_clause_reuse(&mut h, &mut vec![lit(1, true), lit(2, true)]);
        let mut out = Vec::new();
        write_dimacs(&s, &mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "p cnf 3 2\n1 -2 0\n2 3 0\n");
    }

    #[test]
    fn test_root_facts_simplify_output() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        for _ in 0..3 {
            s.new_var_default(&mut h);
        }
        // unit a; clause (a | b) is satisfied, clause (-a | b | c) loses -a
        s.add_clause_reuse(&mut h, &mut vec![lit(0, true)]);
        s.add_clause_reuse(&mut h, &mut vec![lit(0, true), lit(1, true)]);
        s.add_clause_reuse(&mut h, &mut vec![lit(0, false), lit(1, true), lit(2, true)]);
        let mut out = Vec::new();
        write_dimacs(&s, &mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "p cnf 2 1\n1 2 0\n");
    }

    #[test]
    fn test_unsat_state_is_canonical() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        s.new_var_default(&mut h);
        s.add_clause_reuse(&mut h, &mut vec![lit(0, true)]);
        s.add_clause_reuse(&mut h, &mut vec![lit(0, false)]);
        assert!(!s.is_ok());
        let mut out = Vec::new();
        write_dimacs(&s, &mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "p cnf 1 2\n1 0\n-1 0\n");
    }
}
