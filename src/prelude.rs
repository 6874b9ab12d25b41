//! libpy's prelude.
//!
//! The purpose of this module is to alleviate imports of many commonly used items of the libpy
//! crate by adding a glob import to the top of modules which use it heavily:
//!
//! ```
//! # #![allow(unused_imports)]
//! use libpy::prelude::*;
//! ```

pub use crate::automethod::{FromArg, StaticMethodDef};
pub use crate::conversion::{IntoArgs, IntoObject};
pub use crate::err::{PyErr, PyResult};
pub use crate::exceptions::ExceptionMethods;
pub use crate::instance::{AsPyPointer, Handle, NonNullObject, Object, Owned, Py};
pub use crate::marker::Python;
pub use crate::types::{
    AnyMethods, ListMethods, LongMethods, PyAny, PyList, PyLong, PyString, PyTuple, PyType,
    StringMethods, TupleMethods, TypeMethods,
};
