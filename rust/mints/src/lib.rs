//! # mints — Metaheuristic INTeger Solver
//!
//! A penalty-augmented tabu-search engine for integer linear programs:
//! integer decision variables, linear constraints, a linear objective. The
//! solver iteratively improves an incumbent solution by evaluating large
//! structured neighborhoods of local moves, guided by adaptive
//! constraint-penalty coefficients; an outer controller alternates
//! tabu-search episodes with penalty updates, optional Lagrange-dual
//! bounding, and local-search polishing.
//!
//! ## Building a model
//!
//! ```rust
//! use mints::{solve, Expr, Model, SolverOption, Status};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = Model::new("simple");
//! let x = model.create_variables("x", &[2], -100, 100)?;
//! model.add_constraint("g[0]", Expr::term(x[0], 66.0).plus_term(x[1], 14.0).ge(1430.0))?;
//! model.add_constraint("g[1]", Expr::term(x[0], -82.0).plus_term(x[1], 28.0).ge(1306.0))?;
//! model.minimize(Expr::term(x[0], 1.0).plus_term(x[1], 10.0));
//!
//! let mut option = SolverOption::default();
//! option.general.time_max = 5.0;
//! option.general.target_objective_value = 707.0;
//! let result = solve(&mut model, &option)?;
//! assert_ne!(result.status, Status::Infeasible);
//! # Ok(()) }
//! ```
//!
//! ## Loading from files
//!
//! Standard MPS files (fixed or free) and pseudo-Boolean OPB/WBO files are
//! supported; see the [`mps`] and [`pb`] modules. Auxiliary
//! whitespace-separated name files (fixed variables, initial values,
//! flippable pairs) are read by the [`helper`] module.

// Public modules
pub mod helper;
pub mod mps;
pub mod pb;

// Internal modules
mod atol;
mod evaluate;
mod model;
mod neighborhood;
mod option;
mod presolve;
mod solution;
mod solver;
mod utility;

pub use atol::*;
pub use evaluate::{
    evaluate_move, evaluate_move_exhaustive, evaluate_moves, update_improvability_marks,
    EvaluationScratch,
};
pub use model::*;
pub use neighborhood::*;
pub use option::*;
pub use presolve::*;
pub use solution::*;
pub use solver::*;
pub use utility::{BidirectionalMap, RingQueue, SolverRng, Ucb1Action, Ucb1Learner, UnionFind};
