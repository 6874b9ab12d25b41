//! Useful tips for writing tests:
//!  - Tests are run in parallel; every `py_run!` gets a fresh namespace so they don't collide
//!  - You need to use flush=True to get any output from print

#![allow(dead_code, unused_macros)]

use libpy::prelude::*;

/// Runs dedented `code` in a fresh namespace holding `bindings`, returning the namespace.
pub fn run_with<'py>(
    py: Python<'py>,
    bindings: &[(&str, Object<'_, PyAny>)],
    code: &str,
) -> PyResult<Owned<'py, PyAny>> {
    let namespace = py.eval("{}")?;
    for (name, value) in bindings {
        namespace.set_item(*name, *value)?;
    }
    let code = py
        .import("textwrap")?
        .getattr("dedent")?
        .call1((code,))?;
    py.import("builtins")?
        .getattr("exec")?
        .call1((&code, &namespace))?;
    Ok(namespace)
}

#[macro_export]
macro_rules! py_run {
    ($py:expr, $($val:ident),* ; $code:expr) => {{
        let bindings = [$((stringify!($val), $val.as_object().as_any())),*];
        if let Err(err) = common::run_with($py, &bindings, $code) {
            err.print($py);
            panic!("{}", err);
        }
    }};
}

#[macro_export]
macro_rules! py_assert {
    ($py:expr, $($val:ident),* ; $assertion:expr) => {
        py_run!($py, $($val),* ; concat!("assert ", $assertion))
    };
}

#[macro_export]
macro_rules! py_expect_exception {
    ($py:expr, $($val:ident),* ; $code:expr, $err:ident) => {{
        let bindings = [$((stringify!($val), $val.as_object().as_any())),*];
        let err = common::run_with($py, &bindings, $code).unwrap_err();
        if !err.is_instance_of::<libpy::exceptions::$err>($py) {
            panic!("Expected {} but got {:?}", stringify!($err), err)
        }
        err
    }};
}
