pub mod harness;

mod classes;
mod conditionals;
mod dispatch;
mod functions;
mod literals;
mod loops;
mod operators;
mod printf;
