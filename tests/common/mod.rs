//! Shared program fixtures for integration tests.
// Each integration test target consumes a subset of these builders.
#![allow(dead_code)]

use subset_r_vm::{Arg, Program, ProgramBuilder, Val};

pub fn lit(n: i64) -> Arg {
    Arg::Lit(Val::num(n))
}

pub fn reg(r: usize) -> Arg {
    Arg::Reg(r)
}

/// `main: x <- c(1,2,3); y <- get(x, 2)`. Returns the program and the pc
/// just after the `get`, where its result has merged.
pub fn get_element_program() -> (Program, usize) {
    let mut b = ProgramBuilder::new();
    b.begin_function("main");
    b.call(0, "c", vec![lit(1), lit(2), lit(3)]);
    b.call(1, "get", vec![reg(0), lit(2)]);
    let after_get = b.here();
    b.end_function();
    (b.build().unwrap(), after_get)
}

/// `main: x <- c(1,2,3); y <- get(x, 5)`: a provable bounds violation.
pub fn out_of_bounds_program() -> Program {
    let mut b = ProgramBuilder::new();
    b.begin_function("main");
    b.call(0, "c", vec![lit(1), lit(2), lit(3)]);
    b.call(1, "get", vec![reg(0), lit(5)]);
    b.end_function();
    b.build().unwrap()
}

/// A function with an `if` over its parameter, called with both a truthy
/// and a falsy argument:
///
/// ```text
/// f(cond): x <- 2; if (cond) x <- 1; use <- length(x)
/// main:    r0 <- f(1); r1 <- f(0)
/// ```
///
/// Returns the program and the pc of the `length` call, the join point
/// where both branch values of `x` (register 1) have merged.
pub fn branch_join_program() -> (Program, usize) {
    let mut b = ProgramBuilder::new();
    b.begin_function("f");
    b.call(1, "add", vec![lit(2), lit(0)]);
    let hole = b.branch_hole(0);
    b.call(1, "add", vec![lit(1), lit(0)]);
    b.merge();
    let join = b.here();
    b.patch_branch(hole, join);
    b.call(2, "length", vec![reg(1)]);
    b.end_function();
    b.begin_function("main");
    b.call(0, "f", vec![lit(1)]);
    b.call(1, "f", vec![lit(0)]);
    b.end_function();
    (b.build().unwrap(), join)
}

/// A function called from two sites with different constant arguments:
///
/// ```text
/// f(a):  r1 <- add(a, a)
/// main:  r0 <- f(1); r1 <- f(2)
/// ```
///
/// Returns the program and the pc of `f`'s body, where the joined
/// parameter is visible in register 0.
pub fn two_call_sites_program() -> (Program, usize) {
    let mut b = ProgramBuilder::new();
    b.begin_function("f");
    let body = b.here();
    b.call(1, "add", vec![reg(0), reg(0)]);
    b.end_function();
    b.begin_function("main");
    b.call(0, "f", vec![lit(1)]);
    b.call(1, "f", vec![lit(2)]);
    b.end_function();
    (b.build().unwrap(), body)
}

/// A countdown loop whose abstract guard is an unbounded number:
///
/// ```text
/// f(n):  while (n) n <- sub(n, 1)
/// main:  r0 <- f(3); r1 <- f(10)
/// ```
pub fn countdown_program() -> Program {
    let mut b = ProgramBuilder::new();
    b.begin_function("f");
    let head = b.branch_hole(0);
    b.call(0, "sub", vec![reg(0), lit(1)]);
    b.jump(head);
    b.merge();
    b.patch_branch(head, b.here());
    b.end_function();
    b.begin_function("main");
    b.call(0, "f", vec![lit(3)]);
    b.call(1, "f", vec![lit(10)]);
    b.end_function();
    b.build().unwrap()
}

/// A write into a one-element vector, read back:
/// `main: x <- c(5); y <- set(x, 1, 9); z <- get(y, 1)`.
pub fn scalar_set_program() -> Program {
    let mut b = ProgramBuilder::new();
    b.begin_function("main");
    b.call(0, "c", vec![lit(5)]);
    b.call(1, "set", vec![reg(0), lit(1), lit(9)]);
    b.call(2, "get", vec![reg(1), lit(1)]);
    b.end_function();
    b.build().unwrap()
}

/// String vector indexing: `main: s <- c("a","b"); t <- get(s, 1)`.
pub fn string_program() -> Program {
    let mut b = ProgramBuilder::new();
    b.begin_function("main");
    b.call(
        0,
        "c",
        vec![Arg::Lit(Val::string("a")), Arg::Lit(Val::string("b"))],
    );
    b.call(1, "get", vec![reg(0), lit(1)]);
    b.end_function();
    b.build().unwrap()
}
