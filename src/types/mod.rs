//! Various types defined by the Python interpreter such as `int`, `str` and `tuple`.
//!
//! Each type is a zero-sized marker used as the kind parameter of the handles, for example
//! `Owned<'py, PyTuple>`. The operations available for a kind are collected in an extension
//! trait (`TupleMethods`, `ListMethods`, ...) which is implemented for every handle of that
//! kind. Handles of any kind also dereference to their `PyAny` counterpart, which carries the
//! generic object protocol of [`AnyMethods`].

pub use self::any::{AnyMethods, CompareOp, PyAny};
pub use self::iterator::PyIterator;
pub use self::list::{ListMethods, PyList};
pub use self::long::{LongMethods, Overflow, PyLong};
pub use self::string::{PyString, StringMethods};
pub use self::tuple::{BorrowedTupleIterator, PyTuple, TupleMethods};
pub use self::typeobject::{PyType, TypeMethods};

/// Implements the type-object plumbing of a builtin kind marker.
///
/// `$typeobject` is the interpreter's static type object; `$checkfunction`, when given, is the
/// fast subclass check the C API offers for the type.
macro_rules! pyobject_native_type {
    ($name:ty, $typeobject:ident, $python_name:literal $(, #checkfunction=$checkfunction:path)?) => {
        unsafe impl $crate::type_object::PyTypeInfo for $name {
            const NAME: &'static str = $python_name;

            #[inline]
            fn type_object_raw(_py: $crate::Python<'_>) -> *mut $crate::ffi::PyTypeObject {
                unsafe { ::std::ptr::addr_of_mut!($crate::ffi::$typeobject) }
            }

            $(
                #[inline]
                fn is_type_of(object: $crate::Object<'_, $crate::types::PyAny>) -> bool {
                    unsafe { $checkfunction($crate::AsPyPointer::as_ptr(&object)) != 0 }
                }
            )?
        }

        unsafe impl $crate::instance::DerefToPyAny for $name {}
    };
}

pub(crate) mod any;
pub(crate) mod iterator;
pub(crate) mod list;
pub(crate) mod long;
pub(crate) mod string;
pub(crate) mod tuple;
pub(crate) mod typeobject;
