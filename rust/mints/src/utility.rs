//! Small self-contained containers shared across the solver.

mod bimap;
mod ring_queue;
mod rng;
mod ucb1;
mod union_find;

pub use bimap::*;
pub use ring_queue::*;
pub use rng::*;
pub use ucb1::*;
pub use union_find::*;
