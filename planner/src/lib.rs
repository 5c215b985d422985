pub mod extsolvers;
pub mod milp;
pub mod solve;
